//! 元数据定义
//!
//! 提供组件类型、泛型参数以及类型兼容性判断所需的元数据。
//!
//! Rust 没有运行时继承关系，因此类型之间的可赋值关系由 [`TypeInfo`]
//! 显式携带：一个类型可以声明它"可以赋值给"哪些类型（实现的 trait、
//! 声明的父类型等）。

use std::fmt;

/// 类型种类
///
/// 用于区分可注入的组件类型与基础类型、常规类型（字符串、集合、映射、枚举）
/// 和数组类型，后几类不会参与依赖注入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 可注入的组件类型
    Component,
    /// 基础类型（整数、浮点数、布尔、字符等）
    Primitive,
    /// 字符串类型
    Text,
    /// 集合类型
    Collection,
    /// 映射类型
    Map,
    /// 枚举类型
    Enum,
    /// 数组或切片类型
    Array,
}

const PRIMITIVE_NAMES: &[&str] = &[
    "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize", "f32", "f64", "()",
];

const TEXT_NAMES: &[&str] = &[
    "str",
    "alloc::string::String",
    "std::string::String",
    "alloc::borrow::Cow<str>",
    "std::ffi::os_str::OsString",
];

const MAP_MARKERS: &[&str] = &["HashMap<", "BTreeMap<", "DashMap<", "IndexMap<"];

const COLLECTION_PREFIXES: &[&str] = &[
    "alloc::vec::Vec<",
    "alloc::collections::",
    "std::collections::",
    "hashbrown::",
];

impl TypeKind {
    /// 根据类型全名推断类型种类
    pub fn classify(type_name: &str) -> Self {
        let name = type_name
            .trim_start_matches('&')
            .trim_start_matches("'static ")
            .trim_start_matches("mut ");

        if name.starts_with('[') {
            return Self::Array;
        }
        if PRIMITIVE_NAMES.contains(&name) || name.starts_with("core::num::") {
            return Self::Primitive;
        }
        if TEXT_NAMES.contains(&name) {
            return Self::Text;
        }
        if MAP_MARKERS.iter().any(|marker| name.contains(marker)) {
            return Self::Map;
        }
        if COLLECTION_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
            return Self::Collection;
        }
        Self::Component
    }

    /// 是否为可注入的组件类型
    pub fn is_injectable(self) -> bool {
        matches!(self, Self::Component)
    }
}

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型全名
    pub name: String,
    /// 该类型可以赋值给的其他类型名称
    pub ancestors: Vec<String>,
    /// 类型种类
    pub kind: TypeKind,
}

impl TypeInfo {
    /// 从类型名称创建类型信息（用于配置）
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = TypeKind::classify(&name);
        Self {
            name,
            ancestors: Vec::new(),
            kind,
        }
    }

    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::from_name(std::any::type_name::<T>())
    }

    /// 声明该类型可以赋值给指定类型
    pub fn assignable_to<T: ?Sized + 'static>(self) -> Self {
        self.with_ancestor(std::any::type_name::<T>())
    }

    /// 声明该类型可以赋值给指定名称的类型
    pub fn with_ancestor(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name != self.name && !self.ancestors.contains(&name) {
            self.ancestors.push(name);
        }
        self
    }

    /// 覆盖推断出的类型种类
    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// 获取简短的类型名称（不包含模块路径和泛型参数）
    pub fn short_name(&self) -> &str {
        let raw = self.name.split('<').next().unwrap_or(&self.name);
        raw.rsplit("::").next().unwrap_or(raw)
    }

    /// 判断该类型能否赋值给另一个类型（协变：子类型满足父类型请求）
    pub fn is_assignable_to(&self, other: &TypeInfo) -> bool {
        self.is_assignable_to_name(&other.name)
    }

    /// 判断该类型能否赋值给指定名称的类型
    pub fn is_assignable_to_name(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|ancestor| ancestor == name)
    }

    /// 是否为可注入的组件类型
    pub fn is_injectable(&self) -> bool {
        self.kind.is_injectable()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 泛型参数
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericArg {
    /// 具体类型
    Concrete(TypeInfo),
    /// 未解析的类型变量，如 `T`
    Variable(String),
    /// 通配符，可带上界或下界
    Wildcard {
        /// 上界：匹配可以赋值给该类型的类型
        upper: Option<TypeInfo>,
        /// 下界：匹配该类型可以赋值给的类型
        lower: Option<TypeInfo>,
    },
    /// 参数化类型，如 `Repository<User>`
    Parameterized {
        /// 原始类型
        raw: TypeInfo,
        /// 类型参数
        args: Vec<GenericArg>,
    },
}

impl GenericArg {
    /// 具体类型参数
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Concrete(TypeInfo::of::<T>())
    }

    /// 具体类型参数（使用类型信息）
    pub fn concrete(type_info: TypeInfo) -> Self {
        Self::Concrete(type_info)
    }

    /// 类型变量
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// 无界通配符
    pub fn any() -> Self {
        Self::Wildcard {
            upper: None,
            lower: None,
        }
    }

    /// 带上界的通配符
    pub fn extends(bound: TypeInfo) -> Self {
        Self::Wildcard {
            upper: Some(bound),
            lower: None,
        }
    }

    /// 带下界的通配符
    pub fn super_of(bound: TypeInfo) -> Self {
        Self::Wildcard {
            upper: None,
            lower: Some(bound),
        }
    }

    /// 参数化类型
    pub fn parameterized(raw: TypeInfo, args: Vec<GenericArg>) -> Self {
        Self::Parameterized { raw, args }
    }
}

impl fmt::Display for GenericArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(type_info) => write!(f, "{type_info}"),
            Self::Variable(name) => f.write_str(name),
            Self::Wildcard { upper, lower } => match (upper, lower) {
                (Some(upper), _) => write!(f, "? extends {upper}"),
                (None, Some(lower)) => write!(f, "? super {lower}"),
                (None, None) => f.write_str("?"),
            },
            Self::Parameterized { raw, args } => {
                write!(f, "{raw}<{}>", describe_generic_args(args))
            }
        }
    }
}

/// 将泛型参数列表格式化为 `A, B, C`
pub fn describe_generic_args(args: &[GenericArg]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
