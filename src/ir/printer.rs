//! LLVM textual IR rendering for the IR structures.

use std::fmt::{Display, Formatter, Result};

use super::{
    BasicBlock, BinaryOp, CastOp, FloatPredicate, Function, FunctionType, GlobalVariable,
    Initializer, Instruction, IntPredicate, IrType, Linkage, Module, Value,
};

/// Renders `name` as an LLVM identifier body, quoting it when it contains
/// characters outside the unquoted identifier alphabet.
pub fn identifier(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '$' | '.' | '_'))
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        return name.to_string();
    }
    format!("\"{}\"", escape_bytes(name.as_bytes()))
}

fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::new();
    for &byte in bytes {
        if (byte.is_ascii_graphic() && byte != b'"' && byte != b'\\') || byte == b' ' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("\\{:02X}", byte));
        }
    }
    out
}

/// Doubles are printed as the hexadecimal image of their bits, which LLVM
/// accepts for every value without rounding.
pub fn format_double(value: f64) -> String {
    format!("0x{:016X}", value.to_bits())
}

impl Display for IrType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I32 => write!(f, "i32"),
            IrType::Double => write!(f, "double"),
            IrType::Pointer(inner) => write!(f, "{}*", inner),
            IrType::Array(element, len) => write!(f, "[{} x {}]", len, element),
        }
    }
}

/// Prints the bare operand (`%t0`, `@x`, `42`); see [`Typed`] for the
/// `type operand` form.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Value::ConstInt {
                ty: IrType::I1,
                value,
            } => write!(f, "{}", if *value != 0 { "true" } else { "false" }),
            Value::ConstInt { value, .. } => write!(f, "{}", value),
            Value::ConstFloat(value) => write!(f, "{}", format_double(*value)),
            Value::Local { name, .. } => write!(f, "%{}", identifier(name)),
            Value::Global { name, .. } => write!(f, "@{}", identifier(name)),
            Value::Null(_) => write!(f, "null"),
        }
    }
}

/// `type operand`
pub struct Typed<'a>(pub &'a Value);

impl Display for Typed<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} {}", self.0.ty(), self.0)
    }
}

fn join_typed(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| Typed(v).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl BinaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::UDiv => "udiv",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

impl IntPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
        }
    }
}

impl FloatPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
        }
    }
}

impl CastOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CastOp::UiToFp => "uitofp",
            CastOp::FpToUi => "fptoui",
            CastOp::ZExt => "zext",
        }
    }
}

impl FunctionType {
    /// `i32 (i8*, ...)`, the explicit callee type variadic calls need.
    fn callee_type(&self) -> String {
        let mut params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        if self.variadic {
            params.push(String::from("..."));
        }
        format!("{} ({})", self.return_type, params.join(", "))
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Instruction::Alloca { dest, ty } => write!(
                f,
                "%{} = alloca {}, align {}",
                identifier(dest),
                ty,
                ty.alignment()
            ),
            Instruction::Load { dest, ty, ptr } => {
                write!(f, "%{} = load {}, {}", identifier(dest), ty, Typed(ptr))
            }
            Instruction::Store { value, ptr } => {
                write!(f, "store {}, {}", Typed(value), Typed(ptr))
            }
            Instruction::Binary { dest, op, lhs, rhs } => write!(
                f,
                "%{} = {} {}, {}",
                identifier(dest),
                op.mnemonic(),
                Typed(lhs),
                rhs
            ),
            Instruction::ICmp {
                dest,
                predicate,
                lhs,
                rhs,
            } => write!(
                f,
                "%{} = icmp {} {}, {}",
                identifier(dest),
                predicate.mnemonic(),
                Typed(lhs),
                rhs
            ),
            Instruction::FCmp {
                dest,
                predicate,
                lhs,
                rhs,
            } => write!(
                f,
                "%{} = fcmp {} {}, {}",
                identifier(dest),
                predicate.mnemonic(),
                Typed(lhs),
                rhs
            ),
            Instruction::Cast {
                dest,
                op,
                value,
                to,
            } => write!(
                f,
                "%{} = {} {} to {}",
                identifier(dest),
                op.mnemonic(),
                Typed(value),
                to
            ),
            Instruction::GetElementPtr {
                dest,
                source_ty,
                ptr,
                indices,
            } => write!(
                f,
                "%{} = getelementptr inbounds {}, {}, {}",
                identifier(dest),
                source_ty,
                Typed(ptr),
                join_typed(indices)
            ),
            Instruction::Call {
                dest,
                callee,
                signature,
                args,
            } => {
                if let Some(dest) = dest {
                    write!(f, "%{} = ", identifier(dest))?;
                }
                let callee_type = if signature.variadic {
                    signature.callee_type()
                } else {
                    signature.return_type.to_string()
                };
                write!(
                    f,
                    "call {} @{}({})",
                    callee_type,
                    identifier(callee),
                    join_typed(args)
                )
            }
            Instruction::Branch { target } => write!(f, "br label %{}", identifier(target)),
            Instruction::CondBranch {
                condition,
                then_block,
                else_block,
            } => write!(
                f,
                "br {}, label %{}, label %{}",
                Typed(condition),
                identifier(then_block),
                identifier(else_block)
            ),
            Instruction::Return { value: Some(value) } => write!(f, "ret {}", Typed(value)),
            Instruction::Return { value: None } => write!(f, "ret void"),
        }
    }
}

impl Display for BasicBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "{}:", identifier(&self.label))?;
        for instruction in &self.instructions {
            writeln!(f, "  {}", instruction)?;
        }
        Ok(())
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let params = self
            .params
            .iter()
            .map(|(name, ty)| format!("{} %{}", ty, identifier(name)))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            f,
            "define {} @{}({}) {{",
            self.return_type,
            identifier(&self.name),
            params
        )?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}

fn initializer_text(ty: &IrType, initializer: &Initializer) -> String {
    match initializer {
        Initializer::Zero => match ty {
            IrType::Array(..) => String::from("zeroinitializer"),
            IrType::Double => format_double(0.0),
            _ => String::from("0"),
        },
        Initializer::Int(value) => value.to_string(),
        Initializer::Float(value) => format_double(*value),
        Initializer::Bytes(bytes) => format!("c\"{}\"", escape_bytes(bytes)),
    }
}

impl Display for GlobalVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let linkage = match self.linkage {
            Linkage::Common => "common ",
            Linkage::Private => "private unnamed_addr ",
            Linkage::External => "",
        };
        let kind = if self.constant { "constant" } else { "global" };
        write!(
            f,
            "@{} = {}{} {} {}, align {}",
            identifier(&self.name),
            linkage,
            kind,
            self.ty,
            initializer_text(&self.ty, &self.initializer),
            self.ty.alignment()
        )
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        writeln!(f, "source_filename = \"{}\"", escape_bytes(self.name.as_bytes()))?;

        if !self.globals.is_empty() {
            writeln!(f)?;
            for global in &self.globals {
                writeln!(f, "{}", global)?;
            }
        }

        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{}", function)?;
        }

        if !self.declarations.is_empty() {
            writeln!(f)?;
            for declaration in &self.declarations {
                let mut params: Vec<String> = declaration
                    .signature
                    .params
                    .iter()
                    .map(|p| p.to_string())
                    .collect();
                if declaration.signature.variadic {
                    params.push(String::from("..."));
                }
                writeln!(
                    f,
                    "declare {} @{}({})",
                    declaration.signature.return_type,
                    identifier(&declaration.name),
                    params.join(", ")
                )?;
            }
        }
        Ok(())
    }
}
