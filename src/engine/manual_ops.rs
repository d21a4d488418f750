// ==========================================
// 喷涂线颜色排序系统 - 人工调整
// ==========================================
// 职责: 按指定换色组顺序重排 / 按位置排列重排（拖拽）
// 红线: 不调用求解器；输入非法时返回 ManualOrderError，不做部分应用
// ==========================================

use crate::domain::item::ColorItem;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManualOrderError {
    #[error("位置数量与颜色项数量不一致: 颜色项 {items}, 位置 {positions}")]
    LengthMismatch { items: usize, positions: usize },

    #[error("位置越界: {position} (共 {len} 个颜色项)")]
    OutOfRange { position: usize, len: usize },

    #[error("位置重复: {position}")]
    Duplicate { position: usize },
}

/// 按换色组顺序重排
///
/// 列出的换色组按给定顺序在前，未列出的按名称升序，未解析项最后；
/// 组内按 (代码, 类型代码) 排序
pub fn apply_cluster_order(items: Vec<ColorItem>, cluster_order: &[String]) -> Vec<ColorItem> {
    let mut by_cluster: BTreeMap<String, Vec<ColorItem>> = BTreeMap::new();
    let mut without_cluster: Vec<ColorItem> = Vec::new();

    for item in items {
        match item.cluster.clone().filter(|c| !c.trim().is_empty()) {
            Some(cluster) => by_cluster.entry(cluster).or_default().push(item),
            None => without_cluster.push(item),
        }
    }

    let sort_group = |group: &mut Vec<ColorItem>| {
        group.sort_by(|a, b| {
            a.code
                .cmp(&b.code)
                .then_with(|| a.item_type.code().cmp(b.item_type.code()))
        });
    };

    let mut ordered: Vec<ColorItem> = Vec::new();
    for cluster in cluster_order {
        if let Some(mut group) = by_cluster.remove(cluster.trim()) {
            sort_group(&mut group);
            ordered.extend(group);
        }
    }
    // BTreeMap 剩余项已按名称升序
    for (_, mut group) in by_cluster {
        sort_group(&mut group);
        ordered.extend(group);
    }
    sort_group(&mut without_cluster);
    ordered.extend(without_cluster);

    assign_locked_positions(&mut ordered);

    tracing::debug!(items = ordered.len(), order = ?cluster_order, "已按换色组顺序重排");
    ordered
}

/// 按位置排列重排
///
/// new_positions[i] = 新序列第 i 位所取的原下标；必须是 0..n 的一个排列
pub fn apply_manual_order(
    items: &[ColorItem],
    new_positions: &[usize],
) -> Result<Vec<ColorItem>, ManualOrderError> {
    if items.len() != new_positions.len() {
        return Err(ManualOrderError::LengthMismatch {
            items: items.len(),
            positions: new_positions.len(),
        });
    }

    let mut used = vec![false; items.len()];
    for &pos in new_positions {
        if pos >= items.len() {
            return Err(ManualOrderError::OutOfRange {
                position: pos,
                len: items.len(),
            });
        }
        if used[pos] {
            return Err(ManualOrderError::Duplicate { position: pos });
        }
        used[pos] = true;
    }

    let mut ordered: Vec<ColorItem> = new_positions.iter().map(|&pos| items[pos].clone()).collect();
    assign_locked_positions(&mut ordered);
    Ok(ordered)
}

/// 锁定项 position = 当前下标，未锁定项清空
pub fn assign_locked_positions(items: &mut [ColorItem]) {
    for (idx, item) in items.iter_mut().enumerate() {
        item.position = item.locked.then_some(idx);
    }
}
