// ==========================================
// 喷涂线颜色排序系统 - 组内颜色排序
// ==========================================
// 职责: 按换色组路径把颜色项展开为最终的平铺序列
// 输入: 换色组路径 + 当日颜色项 + 可选首色代码
// 输出: 排序后的颜色项（每项恰好出现一次）
// ==========================================
// 组内规则:
// 1) 触发项（每组至多一个）: 首色覆盖 > 一个固定色 > 无
// 2) 任一颜色项输出后，立即输出同代码的其余颜色项
//    （同码顺序: F > R > K > 其他 > E，再按序列号）
// 3) 剩余紧急补货 → 剩余非外观色（按类型权重）→ 外观色
// 4) 每一层内按 (序列号, 序列类别) 排序，当天序列优先
// ==========================================

use crate::config::cost_model::TypeWeights;
use crate::domain::item::ColorItem;
use crate::domain::types::ItemType;
use crate::engine::error::EngineIssue;

// ==========================================
// SequencedItems - 排序结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SequencedItems {
    pub items: Vec<ColorItem>,

    /// 实际使用的换色组路径（首色所在组可能被前移）
    pub tour: Vec<String>,

    /// 首色覆盖是否生效
    pub first_item_applied: bool,

    pub issues: Vec<EngineIssue>,
}

// ==========================================
// ColorSequencer
// ==========================================
pub struct ColorSequencer<'a> {
    weights: &'a TypeWeights,
}

impl<'a> ColorSequencer<'a> {
    pub fn new(weights: &'a TypeWeights) -> Self {
        Self { weights }
    }

    /// 生成最终颜色序列
    ///
    /// # 参数
    /// - tour: 换色组路径
    /// - items: 当日颜色项（cluster 已解析）
    /// - first_code: 首色代码（按去空白后匹配）
    ///
    /// # 返回
    /// - 路径外或未解析的颜色项按到达顺序追加在末尾
    pub fn sequence(
        &self,
        tour: &[String],
        items: &[ColorItem],
        first_code: Option<&str>,
    ) -> SequencedItems {
        let mut result = SequencedItems::default();
        let mut tour: Vec<String> = tour.to_vec();

        let first_idx = self.locate_first_item(&tour, items, first_code);
        if let Some(idx) = first_idx {
            if let Some(cluster) = items[idx].cluster.clone() {
                tour.retain(|c| *c != cluster);
                tour.insert(0, cluster);
                result.first_item_applied = true;
            }
        }

        let mut emitted = vec![false; items.len()];
        let mut order: Vec<usize> = Vec::with_capacity(items.len());

        for cluster in &tour {
            let members: Vec<usize> = (0..items.len())
                .filter(|&i| !emitted[i] && items[i].cluster.as_deref() == Some(cluster.as_str()))
                .collect();
            if members.is_empty() {
                continue;
            }

            let override_idx = first_idx.filter(|i| members.contains(i));
            self.sequence_cluster(&members, items, override_idx, &mut emitted, &mut order);
        }

        // 路径外 / 未解析的颜色项
        for (idx, done) in emitted.iter_mut().enumerate() {
            if !*done {
                *done = true;
                order.push(idx);
            }
        }

        if order.len() != items.len() {
            tracing::warn!(expected = items.len(), actual = order.len(), "颜色排序数量不一致");
            result.issues.push(EngineIssue::LengthMismatch {
                context: "颜色排序".to_string(),
                expected: items.len(),
                actual: order.len(),
            });
        }

        result.items = order.into_iter().map(|i| items[i].clone()).collect();
        result.tour = tour;
        result
    }

    /// 定位首色（要求其换色组在路径中）
    fn locate_first_item(
        &self,
        tour: &[String],
        items: &[ColorItem],
        first_code: Option<&str>,
    ) -> Option<usize> {
        let code = first_code.map(str::trim).filter(|c| !c.is_empty())?;

        let Some(idx) = items.iter().position(|it| it.code.trim() == code) else {
            tracing::warn!(first_code = code, "首色代码不在当日颜色项中，忽略");
            return None;
        };

        match items[idx].cluster.as_deref() {
            Some(cluster) if tour.iter().any(|c| c == cluster) => Some(idx),
            _ => {
                tracing::warn!(first_code = code, "首色所在换色组不在路径中，忽略");
                None
            }
        }
    }

    /// 单个换色组内排序
    fn sequence_cluster(
        &self,
        members: &[usize],
        items: &[ColorItem],
        override_idx: Option<usize>,
        emitted: &mut [bool],
        order: &mut Vec<usize>,
    ) {
        let by_sequence = |a: &usize, b: &usize| {
            let (x, y) = (&items[*a], &items[*b]);
            (x.effective_sequence(), x.sequence_class.tie_rank())
                .cmp(&(y.effective_sequence(), y.sequence_class.tie_rank()))
        };

        // 1) 触发项
        let trigger = override_idx.or_else(|| {
            let mut fixed: Vec<usize> = members
                .iter()
                .copied()
                .filter(|&i| items[i].item_type == ItemType::Fixed)
                .collect();
            fixed.sort_by(by_sequence);
            fixed.first().copied()
        });
        if let Some(idx) = trigger {
            self.emit_with_siblings(idx, members, items, emitted, order);
        }

        // 2) 剩余紧急补货
        let mut restock: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| !emitted[i] && items[i].item_type == ItemType::UrgentRestock)
            .collect();
        restock.sort_by(by_sequence);
        for idx in restock {
            if !emitted[idx] {
                self.emit_with_siblings(idx, members, items, emitted, order);
            }
        }

        // 3) 剩余非外观色
        let mut plain: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| !emitted[i] && items[i].item_type != ItemType::Aesthetic)
            .collect();
        plain.sort_by(|a, b| {
            self.weights
                .weight_of(items[*a].item_type)
                .cmp(&self.weights.weight_of(items[*b].item_type))
                .then_with(|| by_sequence(a, b))
        });
        for idx in plain {
            if !emitted[idx] {
                self.emit_with_siblings(idx, members, items, emitted, order);
            }
        }

        // 4) 外观色
        let mut aesthetic: Vec<usize> = members.iter().copied().filter(|&i| !emitted[i]).collect();
        aesthetic.sort_by(by_sequence);
        for idx in aesthetic {
            if !emitted[idx] {
                self.emit_with_siblings(idx, members, items, emitted, order);
            }
        }
    }

    /// 输出颜色项并紧跟其同代码兄弟项
    fn emit_with_siblings(
        &self,
        idx: usize,
        members: &[usize],
        items: &[ColorItem],
        emitted: &mut [bool],
        order: &mut Vec<usize>,
    ) {
        emitted[idx] = true;
        order.push(idx);

        let code = &items[idx].code;
        let mut siblings: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| !emitted[i] && items[i].code == *code)
            .collect();
        siblings.sort_by_key(|&i| {
            let it = &items[i];
            (
                it.item_type.sibling_rank(),
                it.effective_sequence(),
                it.sequence_class.tie_rank(),
            )
        });
        for s in siblings {
            emitted[s] = true;
            order.push(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SequenceClass;

    fn item(code: &str, t: ItemType, cluster: &str) -> ColorItem {
        let mut it = ColorItem::new(code, t);
        it.cluster = Some(cluster.to_string());
        it
    }

    fn labels(items: &[ColorItem]) -> Vec<String> {
        items.iter().map(|i| i.label()).collect()
    }

    fn tour(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fixed_trigger_pulls_siblings() {
        let weights = TypeWeights::default();
        let items = vec![
            item("K1", ItemType::Kit, "A"),
            item("X", ItemType::Aesthetic, "A"),
            item("X", ItemType::Fixed, "A"),
            item("X", ItemType::Kit, "A"),
            item("R1", ItemType::UrgentRestock, "A"),
        ];
        let out = ColorSequencer::new(&weights).sequence(&tour(&["A"]), &items, None);
        assert_eq!(labels(&out.items), vec!["X_F", "X_K", "X_E", "R1_R", "K1_K"]);
    }

    #[test]
    fn test_only_one_fixed_trigger_per_cluster() {
        let weights = TypeWeights::default();
        let items = vec![
            item("F2", ItemType::Fixed, "A").with_sequence(5),
            item("F1", ItemType::Fixed, "A").with_sequence(2),
            item("R1", ItemType::UrgentRestock, "A"),
        ];
        let out = ColorSequencer::new(&weights).sequence(&tour(&["A"]), &items, None);
        // F1 触发；F2 不再抢在补货之前
        assert_eq!(labels(&out.items), vec!["F1_F", "R1_R", "F2_F"]);
    }

    #[test]
    fn test_tiers_and_same_day_tie_break() {
        let weights = TypeWeights::default();
        let items = vec![
            item("E1", ItemType::Aesthetic, "A").with_sequence(1),
            item("K1", ItemType::Kit, "A").with_sequence(1),
            item("RE1", ItemType::NonUrgentRestock, "A").with_sequence(9),
            item("R2", ItemType::UrgentRestock, "A")
                .with_sequence(3)
                .with_sequence_class(SequenceClass::NextDay),
            item("R1", ItemType::UrgentRestock, "A")
                .with_sequence(3)
                .with_sequence_class(SequenceClass::SameDay),
        ];
        let out = ColorSequencer::new(&weights).sequence(&tour(&["A"]), &items, None);
        assert_eq!(
            labels(&out.items),
            vec!["R1_R", "R2_R", "RE1_RE", "K1_K", "E1_E"]
        );
    }

    #[test]
    fn test_follows_tour_and_appends_unresolved() {
        let weights = TypeWeights::default();
        let mut lost = ColorItem::new("ZZ", ItemType::Kit);
        lost.cluster = None;
        let items = vec![
            item("A1", ItemType::Kit, "A"),
            lost,
            item("B1", ItemType::Kit, "B"),
        ];
        let out = ColorSequencer::new(&weights).sequence(&tour(&["B", "A"]), &items, None);
        assert_eq!(labels(&out.items), vec!["B1_K", "A1_K", "ZZ_K"]);
        assert!(out.issues.is_empty());
    }

    #[test]
    fn test_first_item_moves_cluster_to_front() {
        let weights = TypeWeights::default();
        let items = vec![
            item("A1", ItemType::Fixed, "A"),
            item("B1", ItemType::Fixed, "B"),
            item("B2", ItemType::Aesthetic, "B"),
            item("B2", ItemType::UrgentRestock, "B"),
        ];
        let out =
            ColorSequencer::new(&weights).sequence(&tour(&["A", "B"]), &items, Some(" B2 "));

        assert!(out.first_item_applied);
        assert_eq!(out.tour, tour(&["B", "A"]));
        // 首色为到达顺序中的第一个 B2，其兄弟项按 F > R > K > 其他 > E
        assert_eq!(labels(&out.items), vec!["B2_E", "B2_R", "B1_F", "A1_F"]);
    }

    #[test]
    fn test_unknown_first_item_is_ignored() {
        let weights = TypeWeights::default();
        let items = vec![item("A1", ItemType::Fixed, "A")];
        let out = ColorSequencer::new(&weights).sequence(&tour(&["A"]), &items, Some("NOPE"));
        assert!(!out.first_item_applied);
        assert_eq!(out.items.len(), 1);
    }

    #[test]
    fn test_same_code_items_are_contiguous() {
        let weights = TypeWeights::default();
        let items = vec![
            item("C1", ItemType::Aesthetic, "A").with_sequence(1),
            item("C2", ItemType::Kit, "A").with_sequence(2),
            item("C1", ItemType::Kit, "A").with_sequence(7),
            item("C2", ItemType::Aesthetic, "A").with_sequence(0),
            item("C3", ItemType::NonUrgentRestock, "A"),
            item("C1", ItemType::UrgentRestock, "A").with_sequence(9),
        ];
        let out = ColorSequencer::new(&weights).sequence(&tour(&["A"]), &items, None);
        assert_eq!(out.items.len(), items.len());

        let codes: Vec<&str> = out.items.iter().map(|i| i.code.as_str()).collect();
        let mut seen: Vec<&str> = Vec::new();
        for (i, code) in codes.iter().enumerate() {
            if i > 0 && codes[i - 1] == *code {
                continue;
            }
            assert!(!seen.contains(code), "代码 {} 不连续: {:?}", code, codes);
            seen.push(code);
        }
    }
}
