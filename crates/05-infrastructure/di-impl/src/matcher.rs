//! 按类型解析时的候选项匹配

use di_abstractions::{MatchCandidate, TypeMatcher};
use infrastructure_common::{
    describe_generic_args, ComponentDescriptor, DependencyError, DependencyResult, GenericArg,
    InstanceRecord, TypeInfo,
};
use std::sync::Arc;

/// 按类型解析的候选项：已发布的实例或尚未创建的定义
#[derive(Debug, Clone)]
pub enum Candidate {
    Published(InstanceRecord),
    Definition(Arc<ComponentDescriptor>),
}

impl MatchCandidate for Candidate {
    fn candidate_type(&self) -> &TypeInfo {
        match self {
            Self::Published(record) => record.candidate_type(),
            Self::Definition(descriptor) => descriptor.candidate_type(),
        }
    }

    fn candidate_generics(&self) -> &[GenericArg] {
        match self {
            Self::Published(record) => record.candidate_generics(),
            Self::Definition(descriptor) => descriptor.candidate_generics(),
        }
    }

    fn candidate_label(&self) -> String {
        match self {
            Self::Published(record) => record.candidate_label(),
            Self::Definition(descriptor) => descriptor.candidate_label(),
        }
    }
}

/// 默认类型匹配器
///
/// 泛型参数规则：
/// - 任意一方没有泛型参数时视为兼容
/// - 否则参数个数必须相同且逐个兼容
/// - 相同类型兼容，两个类型变量兼容
/// - 带上界的通配符接受可以赋值给上界的类型，带下界的通配符接受下界可以赋值给的类型
/// - 两个通配符在边界相同时兼容
/// - 参数化类型要求原始类型相同，并递归比较各自的参数
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeMatcherImpl;

impl TypeMatcherImpl {
    pub fn new() -> Self {
        Self
    }

    /// 从候选项中选出唯一兼容的一项
    ///
    /// 没有兼容项返回 `None`，多于一项返回 [`DependencyError::AmbiguousComponent`]。
    pub fn select<C: MatchCandidate>(
        &self,
        candidates: Vec<C>,
        type_name: &str,
        generic_args: &[GenericArg],
    ) -> DependencyResult<Option<C>> {
        let mut matched: Vec<C> = candidates
            .into_iter()
            .filter(|candidate| self.is_compatible(candidate, type_name, generic_args))
            .collect();

        if matched.len() > 1 {
            let requested = if generic_args.is_empty() {
                type_name.to_string()
            } else {
                format!("{type_name}<{}>", describe_generic_args(generic_args))
            };
            return Err(DependencyError::AmbiguousComponent {
                type_name: requested,
                candidates: matched.iter().map(MatchCandidate::candidate_label).collect(),
            });
        }
        Ok(matched.pop())
    }

    fn args_compatible(&self, requested: &[GenericArg], candidate: &[GenericArg]) -> bool {
        requested.len() == candidate.len()
            && requested
                .iter()
                .zip(candidate)
                .all(|(left, right)| self.arg_compatible(left, right))
    }

    fn arg_compatible(&self, left: &GenericArg, right: &GenericArg) -> bool {
        match (left, right) {
            (
                GenericArg::Wildcard { upper, lower },
                GenericArg::Wildcard {
                    upper: other_upper,
                    lower: other_lower,
                },
            ) => same_bound(upper, other_upper) && same_bound(lower, other_lower),
            (GenericArg::Wildcard { upper, lower }, other)
            | (other, GenericArg::Wildcard { upper, lower }) => {
                wildcard_accepts(upper.as_ref(), lower.as_ref(), other)
            }
            (GenericArg::Variable(_), GenericArg::Variable(_)) => true,
            (GenericArg::Concrete(left), GenericArg::Concrete(right)) => left.name == right.name,
            (
                GenericArg::Parameterized { raw, args },
                GenericArg::Parameterized {
                    raw: other_raw,
                    args: other_args,
                },
            ) => raw.name == other_raw.name && self.args_compatible(args, other_args),
            _ => false,
        }
    }
}

impl TypeMatcher for TypeMatcherImpl {
    fn generics_compatible(&self, requested: &[GenericArg], candidate: &[GenericArg]) -> bool {
        if requested.is_empty() || candidate.is_empty() {
            return true;
        }
        self.args_compatible(requested, candidate)
    }
}

fn same_bound(left: &Option<TypeInfo>, right: &Option<TypeInfo>) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => left.name == right.name,
        (None, None) => true,
        _ => false,
    }
}

fn wildcard_accepts(upper: Option<&TypeInfo>, lower: Option<&TypeInfo>, other: &GenericArg) -> bool {
    if upper.is_none() && lower.is_none() {
        return true;
    }
    let other_type = match other {
        GenericArg::Concrete(type_info) => type_info,
        GenericArg::Parameterized { raw, .. } => raw,
        _ => return false,
    };
    let upper_ok = upper.map_or(true, |bound| other_type.is_assignable_to(bound));
    let lower_ok = lower.map_or(true, |bound| bound.is_assignable_to(other_type));
    upper_ok && lower_ok
}
