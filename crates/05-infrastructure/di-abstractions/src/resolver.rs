//! 组件解析器抽象接口
//!
//! 提供单次解析调用的依赖链和按类型匹配候选组件的能力

use infrastructure_common::{
    ComponentDescriptor, DependencyError, DependencyResult, GenericArg, InstanceRecord, TypeInfo,
};

/// 解析上下文
///
/// 由顶层 `get` 调用创建，并以参数形式沿递归传递，
/// 不同线程上的解析互不可见。
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前正在构建的类型链，用于检测循环依赖
    chain: Vec<String>,
    /// 解析选项
    options: ResolveOptions,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定选项创建解析上下文
    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            chain: Vec::new(),
            options,
        }
    }

    /// 类型是否正在构建
    pub fn contains(&self, type_name: &str) -> bool {
        self.chain.iter().any(|entry| entry == type_name)
    }

    /// 类型已在构建链中时返回循环依赖错误
    pub fn ensure_not_constructing(&self, type_name: &str) -> DependencyResult<()> {
        if self.contains(type_name) {
            let mut chain = self.chain.clone();
            chain.push(type_name.to_string());
            return Err(DependencyError::CircularDependency { chain });
        }
        Ok(())
    }

    /// 添加类型到解析链
    pub fn push_type(&mut self, type_name: &str) -> DependencyResult<()> {
        self.ensure_not_constructing(type_name)?;
        if self.chain.len() >= self.options.max_depth {
            let mut chain = self.chain.clone();
            chain.push(type_name.to_string());
            return Err(DependencyError::ResolutionDepthExceeded {
                max_depth: self.options.max_depth,
                chain,
            });
        }
        self.chain.push(type_name.to_string());
        Ok(())
    }

    /// 从解析链中移除类型
    pub fn pop_type(&mut self) {
        self.chain.pop();
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }
}

/// 解析选项
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// 最大递归深度
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// 参与类型匹配的候选项
pub trait MatchCandidate {
    /// 候选项的类型
    fn candidate_type(&self) -> &TypeInfo;

    /// 候选项的泛型参数
    fn candidate_generics(&self) -> &[GenericArg];

    /// 用于错误信息的名称
    fn candidate_label(&self) -> String {
        self.candidate_type().name.clone()
    }
}

impl MatchCandidate for InstanceRecord {
    fn candidate_type(&self) -> &TypeInfo {
        &self.type_info
    }

    fn candidate_generics(&self) -> &[GenericArg] {
        &self.generic_args
    }

    fn candidate_label(&self) -> String {
        self.key().to_string()
    }
}

impl MatchCandidate for ComponentDescriptor {
    fn candidate_type(&self) -> &TypeInfo {
        self.type_info()
    }

    fn candidate_generics(&self) -> &[GenericArg] {
        self.generic_args()
    }

    fn candidate_label(&self) -> String {
        self.key().to_string()
    }
}

impl<C: MatchCandidate + ?Sized> MatchCandidate for std::sync::Arc<C> {
    fn candidate_type(&self) -> &TypeInfo {
        (**self).candidate_type()
    }

    fn candidate_generics(&self) -> &[GenericArg] {
        (**self).candidate_generics()
    }

    fn candidate_label(&self) -> String {
        (**self).candidate_label()
    }
}

/// 类型匹配器 trait
pub trait TypeMatcher: Send + Sync {
    /// 候选类型能否满足请求的基础类型
    fn is_type_compatible(&self, candidate: &TypeInfo, requested_type: &str) -> bool {
        candidate.is_assignable_to_name(requested_type)
    }

    /// 请求方与候选项的泛型参数是否兼容
    fn generics_compatible(&self, requested: &[GenericArg], candidate: &[GenericArg]) -> bool;

    /// 候选项是否同时满足类型与泛型要求
    fn is_compatible(
        &self,
        candidate: &dyn MatchCandidate,
        requested_type: &str,
        requested_generics: &[GenericArg],
    ) -> bool {
        self.is_type_compatible(candidate.candidate_type(), requested_type)
            && self.generics_compatible(requested_generics, candidate.candidate_generics())
    }
}
