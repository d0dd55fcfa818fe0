// ==========================================
// 试剂条码合成系统 - 最近锚点匹配器
// ==========================================
// 优先级: LOT_EXACT -> BOTTLE_REAGENT -> ITEM_ONLY -> NONE
// 同层内取序列号距离最小者, 距离相同取加载顺序靠前者
// ==========================================

use crate::domain::anchor::AnchorSample;
use crate::domain::layout::{self, digit_at, MIN_MATCH_LEN, PREFIX_LEN};
use crate::domain::request::GenerationRequest;
use crate::domain::types::MatchTier;

/// 匹配查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    pub item_code: String,
    pub bottle_code: char,
    pub reagent_code: char,
    /// 3 位批号
    pub lot: String,
    pub serial: u32,
}

impl From<&GenerationRequest> for MatchQuery {
    fn from(req: &GenerationRequest) -> Self {
        Self {
            item_code: req.item_code.clone(),
            bottle_code: req.bottle_code,
            reagent_code: req.reagent_code,
            lot: req.lot.clone(),
            serial: req.serial_value(),
        }
    }
}

/// 匹配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedAnchor<'a> {
    pub tier: MatchTier,
    pub anchor: &'a AnchorSample,
    /// 序列号距离 (序列号无法解析时为 u32::MAX)
    pub distance: u32,
}

/// 匹配器配置
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// 参与批号精确匹配的最小条码长度
    pub min_match_len: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_match_len: MIN_MATCH_LEN,
        }
    }
}

/// AnchorMatcher - 最近锚点匹配器
#[derive(Debug, Clone, Default)]
pub struct AnchorMatcher {
    config: MatcherConfig,
}

impl AnchorMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// 按优先级查找最近锚点
    ///
    /// # 参数
    /// - anchors: 锚点列表 (加载顺序)
    /// - query: 匹配查询
    ///
    /// # 返回
    /// - None: 没有任何锚点的项目号与查询一致
    pub fn find_closest<'a>(
        &self,
        anchors: &'a [AnchorSample],
        query: &MatchQuery,
    ) -> Option<MatchedAnchor<'a>> {
        let same_item: Vec<&AnchorSample> = anchors
            .iter()
            .filter(|a| a.item_code == query.item_code)
            .collect();
        if same_item.is_empty() {
            return None;
        }

        // 1) 瓶型 + 试剂位 + 批号区 全部一致
        let lot_exact = same_item.iter().copied().filter(|a| {
            a.len() >= self.config.min_match_len
                && same_bottle_reagent(a, query)
                && a.lot_region() == Some(query.lot.as_str())
        });
        if let Some(found) = closest(lot_exact, query.serial, MatchTier::LotExact) {
            return Some(found);
        }

        // 2) 忽略批号, 瓶型 + 试剂位一致
        let bottle_reagent = same_item
            .iter()
            .copied()
            .filter(|a| a.len() >= PREFIX_LEN && same_bottle_reagent(a, query));
        if let Some(found) = closest(bottle_reagent, query.serial, MatchTier::BottleReagent) {
            return Some(found);
        }

        // 3) 仅项目号一致
        closest(same_item.into_iter(), query.serial, MatchTier::ItemOnly)
    }
}

/// 以默认配置查找最近锚点
pub fn find_closest<'a>(
    anchors: &'a [AnchorSample],
    item_code: &str,
    bottle_code: char,
    reagent_code: char,
    serial: u32,
    lot: &str,
) -> Option<MatchedAnchor<'a>> {
    let query = MatchQuery {
        item_code: item_code.to_string(),
        bottle_code,
        reagent_code,
        lot: lot.to_string(),
        serial,
    };
    AnchorMatcher::default().find_closest(anchors, &query)
}

fn same_bottle_reagent(anchor: &AnchorSample, query: &MatchQuery) -> bool {
    let bottle = query.bottle_code.to_digit(10).map(|d| d as u8);
    let reagent = query.reagent_code.to_digit(10).map(|d| d as u8);
    bottle.is_some()
        && reagent.is_some()
        && digit_at(&anchor.full_code, layout::BOTTLE_POS) == bottle
        && digit_at(&anchor.full_code, layout::REAGENT_POS) == reagent
}

fn serial_distance(anchor: &AnchorSample, serial: u32) -> u32 {
    anchor
        .serial_value()
        .map(|v| v.abs_diff(serial))
        .unwrap_or(u32::MAX)
}

/// min_by_key 在距离相同时返回第一个元素
fn closest<'a>(
    candidates: impl Iterator<Item = &'a AnchorSample>,
    serial: u32,
    tier: MatchTier,
) -> Option<MatchedAnchor<'a>> {
    candidates
        .map(|anchor| (anchor, serial_distance(anchor, serial)))
        .min_by_key(|(_, distance)| *distance)
        .map(|(anchor, distance)| MatchedAnchor {
            tier,
            anchor,
            distance,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ic: &str, s: &str, f: &str) -> AnchorSample {
        AnchorSample::new(ic, "R1", s, f)
    }

    #[test]
    fn test_lot_exact_preferred() {
        let anchors = vec![
            sample("010", "8931", "01021240930100889311"),
            sample("010", "5000", "01021240930900950001"),
        ];
        let m = find_closest(&anchors, "010", '2', '1', 8932, "009").unwrap();
        assert_eq!(m.tier, MatchTier::LotExact);
        assert_eq!(m.anchor.serial, "5000");
        assert_eq!(m.distance, 3932);
    }

    #[test]
    fn test_bottle_reagent_tier() {
        let anchors = vec![
            sample("010", "0100", "01012240930100801005"),
            sample("010", "0200", "01021240930100802005"),
        ];
        let m = find_closest(&anchors, "010", '2', '1', 100, "777").unwrap();
        assert_eq!(m.tier, MatchTier::BottleReagent);
        assert_eq!(m.anchor.serial, "0200");
    }

    #[test]
    fn test_item_only_tier() {
        let anchors = vec![sample("010", "0100", "01012240930100801005")];
        let m = find_closest(&anchors, "010", '3', '1', 100, "008").unwrap();
        assert_eq!(m.tier, MatchTier::ItemOnly);
        assert_eq!(m.distance, 0);
    }

    #[test]
    fn test_no_item_match() {
        let anchors = vec![sample("010", "0100", "01012240930100801005")];
        assert!(find_closest(&anchors, "999", '1', '1', 100, "008").is_none());
        assert!(find_closest(&[], "010", '1', '1', 100, "008").is_none());
    }

    #[test]
    fn test_tie_break_by_load_order() {
        let anchors = vec![
            sample("010", "8930", "01021240930000989304"),
            sample("010", "8934", "01021240930300989346"),
        ];
        let m = find_closest(&anchors, "010", '2', '1', 8932, "009").unwrap();
        assert_eq!(m.anchor.serial, "8930");
    }

    #[test]
    fn test_malformed_serial_is_farthest() {
        let anchors = vec![
            sample("010", "N/A", "01021240930900989311"),
            sample("010", "0001", "01021240930900900011"),
        ];
        let m = find_closest(&anchors, "010", '2', '1', 8932, "009").unwrap();
        assert_eq!(m.anchor.serial, "0001");

        let only_bad = vec![sample("010", "N/A", "01021240930900989311")];
        let m = find_closest(&only_bad, "010", '2', '1', 8932, "009").unwrap();
        assert_eq!(m.distance, u32::MAX);
    }

    #[test]
    fn test_short_anchor_skips_lot_tier() {
        let anchors = vec![sample("010", "8931", "0102124093")];
        let m = find_closest(&anchors, "010", '2', '1', 8932, "009").unwrap();
        assert_eq!(m.tier, MatchTier::BottleReagent);
    }
}
