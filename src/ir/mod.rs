//! Instruction model for reconstructed method bodies.
//!
//! This is the AST-like working representation the reconstruction passes rewrite. Each
//! method body is a flat `Vec<Instruction>` of statement-level nodes whose operands are
//! owned subtrees. Every node carries:
//!
//! - **`offset`** - byte position in the original bytecode, globally unique within a
//!   method and used as the identity key by back-references
//! - **`line`** - source line number from the `LineNumberTable`, or `None` when unknown
//! - **a kind** - one closed [`InstructionKind`] variant; passes match exhaustively, so
//!   an opcode arriving in a structurally impossible position is a compile-time-visible
//!   gap rather than a runtime downcast failure
//!
//! # Temporaries
//!
//! The JVM's stack-duplication instructions (`dup`, `dup2`) are modelled as a named
//! temporary: a [`InstructionKind::DupStore`] produces the value exactly once, and any
//! number of strictly later [`InstructionKind::DupLoad`] nodes consume it. The link is a
//! plain [`TempId`] handle rather than a reference, so list splicing can never leave a
//! dangling pointer; consumers are resolved by search at rewrite time (see
//! [`search`](crate::ir::search)).
//!
//! # Lifecycle
//!
//! Nodes are created once by the bytecode-to-tree stage and are only replaced wholesale
//! or removed by passes - never mutated in a way that changes their offset identity,
//! because [`InstructionKind::TernaryOpStore`] holds a back-reference by offset.

pub mod compare;
pub mod rewrite;
pub mod search;

use std::fmt;

use crate::metadata::{PoolIndex, PrimitiveKind};

/// Handle naming a `DupStore` temporary.
///
/// Assigned by the bytecode-to-tree stage; unique within one method body.
pub type TempId = u32;

/// Parenthesization rank of an assignment or compound-assignment expression.
pub const PRIORITY_ASSIGNMENT: u8 = 14;

/// Parenthesization rank of a ternary expression.
pub const PRIORITY_TERNARY: u8 = 13;

/// Parenthesization rank of a unary expression.
pub const PRIORITY_UNARY: u8 = 2;

/// A constant operand.
///
/// `PartialEq` on floats is intentional here: two constants are "the same value" exactly
/// when their bit patterns came from the same pool entry or literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    /// `int` constant (also models the smaller integral kinds).
    Int(i32),
    /// `long` constant.
    Long(i64),
    /// `float` constant.
    Float(f32),
    /// `double` constant.
    Double(f64),
    /// The `null` reference.
    Null,
    /// String literal; points at a `String` pool entry.
    Str(PoolIndex),
}

impl ConstValue {
    /// `true` for any numeric constant equal to one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(
            self,
            ConstValue::Int(1) | ConstValue::Long(1)
        ) || matches!(self, ConstValue::Float(f) if *f == 1.0)
            || matches!(self, ConstValue::Double(d) if *d == 1.0)
    }

    /// `true` for any numeric constant equal to minus one.
    #[must_use]
    pub fn is_minus_one(&self) -> bool {
        matches!(
            self,
            ConstValue::Int(-1) | ConstValue::Long(-1)
        ) || matches!(self, ConstValue::Float(f) if *f == -1.0)
            || matches!(self, ConstValue::Double(d) if *d == -1.0)
    }
}

/// Binary operators, with their Java symbol and precedence rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    Ushr,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
}

impl BinaryOp {
    /// Java source symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Ushr => ">>>",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
        }
    }

    /// Symbol of the compound-assignment form, e.g. `+=`.
    #[must_use]
    pub fn compound_symbol(self) -> String {
        format!("{}=", self.symbol())
    }

    /// Java precedence rank; lower binds tighter.
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::Ushr => 5,
            BinaryOp::And => 8,
            BinaryOp::Xor => 9,
            BinaryOp::Or => 10,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Bitwise complement, `~x`.
    BitNot,
}

impl UnaryOp {
    /// Java source symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Numeric widening/narrowing conversions (`i2l`, `d2f`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conversion {
    /// Source primitive kind.
    pub from: PrimitiveKind,
    /// Target primitive kind.
    pub to: PrimitiveKind,
}

/// Comparison kinds of an `If` node.
///
/// Value comparisons test the operand against zero, matching the single-operand
/// `if<cond>` bytecodes; `Null`/`NonNull` match `ifnull`/`ifnonnull`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `== 0`
    Eq,
    /// `!= 0`
    Ne,
    /// `< 0`
    Lt,
    /// `>= 0`
    Ge,
    /// `> 0`
    Gt,
    /// `<= 0`
    Le,
    /// `== null`
    Null,
    /// `!= null`
    NonNull,
}

/// Dispatch kind of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    /// `invokevirtual`
    Virtual,
    /// `invokespecial`
    Special,
    /// `invokestatic`
    Static,
    /// `invokeinterface`
    Interface,
}

/// Element type of an array allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayElement {
    /// Primitive element (`newarray`).
    Primitive(PrimitiveKind),
    /// Reference element (`anewarray`), naming a `Class` pool entry.
    Class(PoolIndex),
}

/// Whether an increment renders before or after its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementPosition {
    /// `++x` / `--x`
    Pre,
    /// `x++` / `x--`
    Post,
}

/// The closed set of node kinds.
///
/// Loads/stores of locals, field and array accesses, operators, invocations, object and
/// array construction, control transfers, and the synthetic variants the reconstruction
/// passes produce and consume.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// A constant operand.
    Const(ConstValue),
    /// Load of a local variable slot.
    LocalLoad {
        /// Local variable index; 0 is `this` in instance methods.
        index: u16,
    },
    /// Store into a local variable slot.
    LocalStore {
        /// Local variable index.
        index: u16,
        /// Value being stored.
        value: Box<Instruction>,
    },
    /// Instance field read.
    GetField {
        /// Object reference.
        object: Box<Instruction>,
        /// `FieldRef` pool index.
        field: PoolIndex,
    },
    /// Instance field write.
    PutField {
        /// Object reference.
        object: Box<Instruction>,
        /// `FieldRef` pool index.
        field: PoolIndex,
        /// Value being stored.
        value: Box<Instruction>,
    },
    /// Static field read.
    GetStatic {
        /// `FieldRef` pool index.
        field: PoolIndex,
    },
    /// Static field write.
    PutStatic {
        /// `FieldRef` pool index.
        field: PoolIndex,
        /// Value being stored.
        value: Box<Instruction>,
    },
    /// Array element read.
    ArrayLoad {
        /// Array reference.
        array: Box<Instruction>,
        /// Element index.
        index: Box<Instruction>,
    },
    /// Array element write.
    ArrayStore {
        /// Array reference.
        array: Box<Instruction>,
        /// Element index.
        index: Box<Instruction>,
        /// Value being stored.
        value: Box<Instruction>,
    },
    /// Binary operator application.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Instruction>,
        /// Right operand.
        right: Box<Instruction>,
    },
    /// Unary operator application.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Instruction>,
    },
    /// Numeric conversion.
    Convert {
        /// Source and target kinds.
        conv: Conversion,
        /// Value being converted.
        value: Box<Instruction>,
    },
    /// Reference cast (`checkcast`).
    Cast {
        /// Target `Class` pool index.
        class: PoolIndex,
        /// Value being cast.
        value: Box<Instruction>,
    },
    /// Method invocation.
    Invoke {
        /// Dispatch kind.
        kind: InvokeKind,
        /// `MethodRef` pool index.
        method: PoolIndex,
        /// Receiver; `None` for static invocations.
        object: Option<Box<Instruction>>,
        /// Arguments in source order.
        args: Vec<Instruction>,
    },
    /// Bare object allocation (`new`), before constructor-call fusion.
    New {
        /// `Class` pool index.
        class: PoolIndex,
    },
    /// Fused allocation-and-construction, `new Foo(args)`.
    InvokeNew {
        /// `Class` pool index.
        class: PoolIndex,
        /// `MethodRef` pool index of the `<init>` being called.
        method: PoolIndex,
        /// Constructor arguments in source order.
        args: Vec<Instruction>,
    },
    /// Array allocation, `new T[count]`.
    NewArray {
        /// Element type.
        element: ArrayElement,
        /// Element count.
        count: Box<Instruction>,
    },
    /// Array allocation with inline element values, `new T[] { ... }`.
    NewInitArray {
        /// Element type.
        element: ArrayElement,
        /// Element values in index order.
        values: Vec<Instruction>,
    },
    /// Conditional branch.
    If {
        /// Comparison against zero or null.
        comparison: Comparison,
        /// Operand being tested.
        operand: Box<Instruction>,
        /// Branch target byte offset.
        target: u32,
    },
    /// Unconditional branch.
    Goto {
        /// Branch target byte offset.
        target: u32,
    },
    /// Method return; `None` for `return` of `void`.
    Return {
        /// Returned value, if any.
        value: Option<Box<Instruction>>,
    },
    /// `monitorenter`.
    MonitorEnter {
        /// Lock object.
        object: Box<Instruction>,
    },
    /// `monitorexit`.
    MonitorExit {
        /// Lock object.
        object: Box<Instruction>,
    },
    /// Discarded expression value (`pop` as a statement wrapper).
    Pop {
        /// The discarded value.
        value: Box<Instruction>,
    },
    /// Pre/post increment or decrement, `x++`, `--x`, ...
    Increment {
        /// Incremented lvalue (local, field, or array element).
        target: Box<Instruction>,
        /// `+1` or `-1`.
        amount: i32,
        /// Prefix or postfix rendering.
        position: IncrementPosition,
    },
    /// Assignment expression, `target = value`.
    Assignment {
        /// Assigned lvalue.
        target: Box<Instruction>,
        /// Assigned value; nesting another `Assignment` yields `a = b = c`.
        value: Box<Instruction>,
    },
    /// Compound assignment, `target OP= value`.
    CompoundAssignment {
        /// The underlying binary operator.
        op: BinaryOp,
        /// Assigned lvalue.
        target: Box<Instruction>,
        /// Right-hand operand.
        value: Box<Instruction>,
    },
    /// Class literal, `Foo.class`.
    ClassLiteral {
        /// `Class` pool index of the referenced type.
        class: PoolIndex,
    },
    /// Qualified outer-instance reference, `Outer.this`.
    OuterThis {
        /// `Class` pool index of the outer class.
        class: PoolIndex,
    },
    /// Synthetic temporary binding modelling `dup`/`dup2`; produced exactly once.
    DupStore {
        /// Temporary handle consumed by later `DupLoad`s.
        temp: TempId,
        /// The duplicated producer expression.
        value: Box<Instruction>,
    },
    /// Reference to a [`InstructionKind::DupStore`] temporary.
    DupLoad {
        /// Handle of the producing `DupStore`.
        temp: TempId,
    },
    /// Records the first branch value of an eventual ternary, plus the offset of the
    /// instruction supplying the second branch value.
    TernaryOpStore {
        /// First branch value.
        value: Box<Instruction>,
        /// Offset of the instruction supplying the second branch value; must be kept in
        /// sync across rewrites.
        second_value_offset: u32,
    },
}

/// Opcode tag of an [`Instruction`], used for search and logging.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumCount, strum::EnumIter,
)]
#[allow(missing_docs)]
pub enum Opcode {
    Const,
    LocalLoad,
    LocalStore,
    GetField,
    PutField,
    GetStatic,
    PutStatic,
    ArrayLoad,
    ArrayStore,
    Binary,
    Unary,
    Convert,
    Cast,
    Invoke,
    New,
    InvokeNew,
    NewArray,
    NewInitArray,
    If,
    Goto,
    Return,
    MonitorEnter,
    MonitorExit,
    Pop,
    Increment,
    Assignment,
    CompoundAssignment,
    ClassLiteral,
    OuterThis,
    DupStore,
    DupLoad,
    TernaryOpStore,
}

/// One node of the working representation.
///
/// See the [module documentation](self) for the identity and lifecycle rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Byte position in the original bytecode; identity key within a method.
    pub offset: u32,
    /// Source line number, or `None` when unknown.
    pub line: Option<u16>,
    /// The node kind and its operands.
    pub kind: InstructionKind,
}

impl Instruction {
    /// Creates a node.
    #[must_use]
    pub fn new(offset: u32, line: Option<u16>, kind: InstructionKind) -> Self {
        Instruction { offset, line, kind }
    }

    /// The opcode tag of this node.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match &self.kind {
            InstructionKind::Const(_) => Opcode::Const,
            InstructionKind::LocalLoad { .. } => Opcode::LocalLoad,
            InstructionKind::LocalStore { .. } => Opcode::LocalStore,
            InstructionKind::GetField { .. } => Opcode::GetField,
            InstructionKind::PutField { .. } => Opcode::PutField,
            InstructionKind::GetStatic { .. } => Opcode::GetStatic,
            InstructionKind::PutStatic { .. } => Opcode::PutStatic,
            InstructionKind::ArrayLoad { .. } => Opcode::ArrayLoad,
            InstructionKind::ArrayStore { .. } => Opcode::ArrayStore,
            InstructionKind::Binary { .. } => Opcode::Binary,
            InstructionKind::Unary { .. } => Opcode::Unary,
            InstructionKind::Convert { .. } => Opcode::Convert,
            InstructionKind::Cast { .. } => Opcode::Cast,
            InstructionKind::Invoke { .. } => Opcode::Invoke,
            InstructionKind::New { .. } => Opcode::New,
            InstructionKind::InvokeNew { .. } => Opcode::InvokeNew,
            InstructionKind::NewArray { .. } => Opcode::NewArray,
            InstructionKind::NewInitArray { .. } => Opcode::NewInitArray,
            InstructionKind::If { .. } => Opcode::If,
            InstructionKind::Goto { .. } => Opcode::Goto,
            InstructionKind::Return { .. } => Opcode::Return,
            InstructionKind::MonitorEnter { .. } => Opcode::MonitorEnter,
            InstructionKind::MonitorExit { .. } => Opcode::MonitorExit,
            InstructionKind::Pop { .. } => Opcode::Pop,
            InstructionKind::Increment { .. } => Opcode::Increment,
            InstructionKind::Assignment { .. } => Opcode::Assignment,
            InstructionKind::CompoundAssignment { .. } => Opcode::CompoundAssignment,
            InstructionKind::ClassLiteral { .. } => Opcode::ClassLiteral,
            InstructionKind::OuterThis { .. } => Opcode::OuterThis,
            InstructionKind::DupStore { .. } => Opcode::DupStore,
            InstructionKind::DupLoad { .. } => Opcode::DupLoad,
            InstructionKind::TernaryOpStore { .. } => Opcode::TernaryOpStore,
        }
    }

    /// Parenthesization rank for eventual printing.
    ///
    /// Leaf and call-like nodes rank 0; operators carry their Java precedence;
    /// assignments and compound assignments rank [`PRIORITY_ASSIGNMENT`]. Wrapper nodes
    /// (`DupStore`, `TernaryOpStore`) expose their payload's rank, since they stand for
    /// the wrapped value.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match &self.kind {
            InstructionKind::Binary { op, .. } => op.priority(),
            InstructionKind::Unary { .. }
            | InstructionKind::Cast { .. }
            | InstructionKind::Increment { .. } => PRIORITY_UNARY,
            InstructionKind::Assignment { .. } | InstructionKind::CompoundAssignment { .. } => {
                PRIORITY_ASSIGNMENT
            }
            InstructionKind::LocalStore { .. }
            | InstructionKind::PutField { .. }
            | InstructionKind::PutStatic { .. }
            | InstructionKind::ArrayStore { .. } => PRIORITY_ASSIGNMENT,
            InstructionKind::DupStore { value, .. }
            | InstructionKind::TernaryOpStore { value, .. } => value.priority(),
            _ => 0,
        }
    }

    /// `true` if this node is the `DupLoad` of the given temporary.
    #[must_use]
    pub fn is_dup_load_of(&self, temp: TempId) -> bool {
        matches!(self.kind, InstructionKind::DupLoad { temp: t } if t == temp)
    }

    /// Shared borrows of the direct operand subtrees, in evaluation order.
    #[must_use]
    pub fn children(&self) -> Vec<&Instruction> {
        match &self.kind {
            InstructionKind::Const(_)
            | InstructionKind::LocalLoad { .. }
            | InstructionKind::GetStatic { .. }
            | InstructionKind::New { .. }
            | InstructionKind::Goto { .. }
            | InstructionKind::ClassLiteral { .. }
            | InstructionKind::OuterThis { .. }
            | InstructionKind::DupLoad { .. } => Vec::new(),
            InstructionKind::Return { value } => value.iter().map(AsRef::as_ref).collect(),
            InstructionKind::LocalStore { value, .. }
            | InstructionKind::PutStatic { value, .. }
            | InstructionKind::Convert { value, .. }
            | InstructionKind::Cast { value, .. }
            | InstructionKind::Pop { value }
            | InstructionKind::DupStore { value, .. }
            | InstructionKind::TernaryOpStore { value, .. } => vec![value],
            InstructionKind::GetField { object, .. }
            | InstructionKind::MonitorEnter { object }
            | InstructionKind::MonitorExit { object } => vec![object],
            InstructionKind::Unary { operand, .. } => vec![operand],
            InstructionKind::If { operand, .. } => vec![operand],
            InstructionKind::Increment { target, .. } => vec![target],
            InstructionKind::NewArray { count, .. } => vec![count],
            InstructionKind::PutField { object, value, .. } => vec![object, value],
            InstructionKind::ArrayLoad { array, index } => vec![array, index],
            InstructionKind::Binary { left, right, .. } => vec![left, right],
            InstructionKind::Assignment { target, value }
            | InstructionKind::CompoundAssignment { target, value, .. } => vec![target, value],
            InstructionKind::ArrayStore {
                array,
                index,
                value,
            } => vec![array, index, value],
            InstructionKind::Invoke { object, args, .. } => {
                let mut children: Vec<&Instruction> =
                    object.iter().map(AsRef::as_ref).collect();
                children.extend(args.iter());
                children
            }
            InstructionKind::InvokeNew { args, .. } => args.iter().collect(),
            InstructionKind::NewInitArray { values, .. } => values.iter().collect(),
        }
    }

    /// Mutable borrows of the direct operand subtrees, in evaluation order.
    pub fn children_mut(&mut self) -> Vec<&mut Instruction> {
        match &mut self.kind {
            InstructionKind::Const(_)
            | InstructionKind::LocalLoad { .. }
            | InstructionKind::GetStatic { .. }
            | InstructionKind::New { .. }
            | InstructionKind::Goto { .. }
            | InstructionKind::ClassLiteral { .. }
            | InstructionKind::OuterThis { .. }
            | InstructionKind::DupLoad { .. } => Vec::new(),
            InstructionKind::Return { value } => value.iter_mut().map(AsMut::as_mut).collect(),
            InstructionKind::LocalStore { value, .. }
            | InstructionKind::PutStatic { value, .. }
            | InstructionKind::Convert { value, .. }
            | InstructionKind::Cast { value, .. }
            | InstructionKind::Pop { value }
            | InstructionKind::DupStore { value, .. }
            | InstructionKind::TernaryOpStore { value, .. } => vec![value],
            InstructionKind::GetField { object, .. }
            | InstructionKind::MonitorEnter { object }
            | InstructionKind::MonitorExit { object } => vec![object],
            InstructionKind::Unary { operand, .. } => vec![operand],
            InstructionKind::If { operand, .. } => vec![operand],
            InstructionKind::Increment { target, .. } => vec![target],
            InstructionKind::NewArray { count, .. } => vec![count],
            InstructionKind::PutField { object, value, .. } => vec![object, value],
            InstructionKind::ArrayLoad { array, index } => vec![array, index],
            InstructionKind::Binary { left, right, .. } => vec![left, right],
            InstructionKind::Assignment { target, value }
            | InstructionKind::CompoundAssignment { target, value, .. } => vec![target, value],
            InstructionKind::ArrayStore {
                array,
                index,
                value,
            } => vec![array, index, value],
            InstructionKind::Invoke { object, args, .. } => {
                let mut children: Vec<&mut Instruction> =
                    object.iter_mut().map(AsMut::as_mut).collect();
                children.extend(args.iter_mut());
                children
            }
            InstructionKind::InvokeNew { args, .. } => args.iter_mut().collect(),
            InstructionKind::NewInitArray { values, .. } => values.iter_mut().collect(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InstructionKind::Const(value) => match value {
                ConstValue::Int(v) => write!(f, "{v}"),
                ConstValue::Long(v) => write!(f, "{v}L"),
                ConstValue::Float(v) => write!(f, "{v}F"),
                ConstValue::Double(v) => write!(f, "{v}D"),
                ConstValue::Null => write!(f, "null"),
                ConstValue::Str(index) => write!(f, "string {index}"),
            },
            InstructionKind::LocalLoad { index } => write!(f, "var{index}"),
            InstructionKind::LocalStore { index, value } => write!(f, "var{index} = {value}"),
            InstructionKind::GetField { object, field } => write!(f, "{object}.{field}"),
            InstructionKind::PutField {
                object,
                field,
                value,
            } => write!(f, "{object}.{field} = {value}"),
            InstructionKind::GetStatic { field } => write!(f, "{field}"),
            InstructionKind::PutStatic { field, value } => write!(f, "{field} = {value}"),
            InstructionKind::ArrayLoad { array, index } => write!(f, "{array}[{index}]"),
            InstructionKind::ArrayStore {
                array,
                index,
                value,
            } => write!(f, "{array}[{index}] = {value}"),
            InstructionKind::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            InstructionKind::Unary { op, operand } => write!(f, "{}{operand}", op.symbol()),
            InstructionKind::Convert { conv, value } => {
                write!(f, "({}){value}", conv.to.java_name())
            }
            InstructionKind::Cast { class, value } => write!(f, "({class}){value}"),
            InstructionKind::Invoke {
                method,
                object,
                args,
                ..
            } => {
                if let Some(object) = object {
                    write!(f, "{object}.")?;
                }
                write!(f, "{method}(")?;
                fmt_list(f, args)?;
                write!(f, ")")
            }
            InstructionKind::New { class } => write!(f, "new {class}"),
            InstructionKind::InvokeNew { class, args, .. } => {
                write!(f, "new {class}(")?;
                fmt_list(f, args)?;
                write!(f, ")")
            }
            InstructionKind::NewArray { count, .. } => write!(f, "new [{count}]"),
            InstructionKind::NewInitArray { values, .. } => {
                write!(f, "new [] {{")?;
                fmt_list(f, values)?;
                write!(f, "}}")
            }
            InstructionKind::If {
                comparison,
                operand,
                target,
            } => write!(f, "if {comparison:?}({operand}) -> {target}"),
            InstructionKind::Goto { target } => write!(f, "goto {target}"),
            InstructionKind::Return { value: Some(value) } => write!(f, "return {value}"),
            InstructionKind::Return { value: None } => write!(f, "return"),
            InstructionKind::MonitorEnter { object } => write!(f, "monitorenter {object}"),
            InstructionKind::MonitorExit { object } => write!(f, "monitorexit {object}"),
            InstructionKind::Pop { value } => write!(f, "pop {value}"),
            InstructionKind::Increment {
                target,
                amount,
                position,
            } => {
                let symbol = if *amount >= 0 { "++" } else { "--" };
                match position {
                    IncrementPosition::Pre => write!(f, "{symbol}{target}"),
                    IncrementPosition::Post => write!(f, "{target}{symbol}"),
                }
            }
            InstructionKind::Assignment { target, value } => write!(f, "{target} = {value}"),
            InstructionKind::CompoundAssignment { op, target, value } => {
                write!(f, "{target} {} {value}", op.compound_symbol())
            }
            InstructionKind::ClassLiteral { class } => write!(f, "{class}.class"),
            InstructionKind::OuterThis { class } => write!(f, "{class}.this"),
            InstructionKind::DupStore { temp, value } => write!(f, "t{temp} := {value}"),
            InstructionKind::DupLoad { temp } => write!(f, "t{temp}"),
            InstructionKind::TernaryOpStore {
                value,
                second_value_offset,
            } => write!(f, "ternary({value}, @{second_value_offset})"),
        }
    }
}

fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Instruction]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
