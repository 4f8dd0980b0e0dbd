// crates/tw_runtime/src/fields.rs

//! 预报场存储
//!
//! 本模块提供按名称索引的预报场集合：
//! - PrognosticField: 场值数组 + 倾向数组 + 交错位置
//! - FieldStore: 名称到预报场的有序映射
//!
//! # 职责边界
//!
//! 倾向的计算（平流、扩散、压力梯度等）由外部协作者完成；
//! 本模块只负责存储与按名遍历。时间积分器按固定顺序遍历所有场，
//! 各场更新互不依赖。

use std::collections::BTreeMap;

use tw_foundation::{TwError, TwResult};

use crate::grid::StaggerLocation;

// ============================================================
// 预报场
// ============================================================

/// 单个预报场
///
/// 持有场值数组 `data` 与对应的倾向数组 `tend`，二者长度一致，
/// 均按网格展平布局（含 halo）。
#[derive(Debug, Clone)]
pub struct PrognosticField {
    /// 场标识
    pub name: String,
    /// 交错位置
    pub location: StaggerLocation,
    /// 场值数组
    pub data: Vec<f64>,
    /// 倾向数组 (d/dt)
    pub tend: Vec<f64>,
}

impl PrognosticField {
    /// 创建零初始化的预报场
    pub fn new(name: impl Into<String>, location: StaggerLocation, ncells: usize) -> Self {
        Self {
            name: name.into(),
            location,
            data: vec![0.0; ncells],
            tend: vec![0.0; ncells],
        }
    }

    /// 同时借出场值与倾向数组
    ///
    /// 时间积分的级内更新需要同时写入两个数组。
    #[inline]
    pub fn arrays_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.data, &mut self.tend)
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ============================================================
// 场存储
// ============================================================

/// 预报场集合
///
/// 使用有序映射保证遍历顺序确定，使多进程在集合通信点上
/// 的到达顺序可复现。
#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    fields: BTreeMap<String, PrognosticField>,
}

impl FieldStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册预报场
    ///
    /// 同名场已存在时为配置错误。
    pub fn register(
        &mut self,
        name: impl Into<String>,
        location: StaggerLocation,
        ncells: usize,
    ) -> TwResult<()> {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return Err(TwError::invalid_input(format!("预报场重复注册: {name}")));
        }
        self.fields
            .insert(name.clone(), PrognosticField::new(name, location, ncells));
        Ok(())
    }

    /// 按名取场
    pub fn get(&self, name: &str) -> Option<&PrognosticField> {
        self.fields.get(name)
    }

    /// 按名取可变场
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PrognosticField> {
        self.fields.get_mut(name)
    }

    /// 场数量
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 有序遍历
    pub fn iter(&self) -> impl Iterator<Item = &PrognosticField> {
        self.fields.values()
    }

    /// 有序可变遍历
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PrognosticField> {
        self.fields.values_mut()
    }

    /// 有序场名列表
    pub fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut store = FieldStore::new();
        store.register("u", StaggerLocation::U, 100).unwrap();
        store.register("th", StaggerLocation::Center, 100).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("u").unwrap().location, StaggerLocation::U);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut store = FieldStore::new();
        store.register("u", StaggerLocation::U, 10).unwrap();
        assert!(store.register("u", StaggerLocation::U, 10).is_err());
    }

    #[test]
    fn test_deterministic_iteration_order() {
        let mut store = FieldStore::new();
        store.register("w", StaggerLocation::W, 10).unwrap();
        store.register("th", StaggerLocation::Center, 10).unwrap();
        store.register("u", StaggerLocation::U, 10).unwrap();

        // BTreeMap 按键排序
        assert_eq!(store.names(), vec!["th", "u", "w"]);
    }

    #[test]
    fn test_arrays_mut_disjoint() {
        let mut field = PrognosticField::new("u", StaggerLocation::U, 4);
        let (data, tend) = field.arrays_mut();
        data[0] = 1.0;
        tend[0] = 2.0;
        assert!((field.data[0] - 1.0).abs() < 1e-12);
        assert!((field.tend[0] - 2.0).abs() < 1e-12);
    }
}
