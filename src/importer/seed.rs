// ==========================================
// 试剂条码合成系统 - 内置种子锚点
// ==========================================
// 锚点文件缺失或损坏时的兜底语料, 加载后总会合并进锚点列表
// ==========================================

use crate::domain::anchor::AnchorSample;

/// (项目号, 试剂角色, 序列号, 完整条码)
const SEED_ANCHORS: [(&str, &str, &str, &str); 15] = [
    ("034", "R1", "8696", "03421240831305186967"),
    ("034", "R2", "8716", "03412240831905187165"),
    ("034", "R1", "8723", "03421241130605287237"),
    ("034", "R2", "8746", "03412241130805287467"),
    ("034", "R1", "9721", "03421250531105397211"),
    ("034", "R2", "9764", "03412250531305397641"),
    ("010", "R1", "8931", "01021240930900989311"),
    ("010", "R1", "8945", "01021240930100989451"),
    ("010", "R2", "9439", "01012240930100994395"),
    ("010", "R1", "0559", "01021241130001005591"),
    ("010", "R1", "0556", "01021241130101005561"),
    ("010", "R2", "1068", "01012241130501010681"),
    ("010", "R1", "0477", "01021251130301304777"),
    ("010", "R1", "0476", "01021251130001304769"),
    ("010", "R2", "0117", "01012251130701301175"),
];

/// 内置种子锚点
pub fn builtin_anchors() -> Vec<AnchorSample> {
    SEED_ANCHORS
        .iter()
        .map(|(ic, rt, s, f)| AnchorSample::new(ic, rt, s, f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_is_well_formed() {
        let seeds = builtin_anchors();
        assert_eq!(seeds.len(), 15);
        let unique: HashSet<&str> = seeds.iter().map(|a| a.full_code.as_str()).collect();
        assert_eq!(unique.len(), seeds.len());
        for a in &seeds {
            assert_eq!(a.len(), 20);
            assert!(a.full_code.starts_with(&a.item_code));
            assert_eq!(&a.full_code[15..19], a.serial);
        }
    }
}
