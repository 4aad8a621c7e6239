//! The quadruple intermediate representation.
//!
//! A compiled program is a flat list of quadruples. Each shape carries its
//! operands with compile-time arity; the textual `.note` form
//! (`op [a] [b] [c]`, whitespace separated, one per line) is produced by the
//! `Display` impls.

use std::fmt;

/// A memory operand of a quadruple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub address: u32,
    /// The slot holds an address rather than a value; rendered with a `&`
    /// prefix. The VM dereferences one level before reading or writing.
    pub indirect: bool,
}

impl Operand {
    pub fn direct(address: u32) -> Self {
        Operand {
            address,
            indirect: false,
        }
    }

    pub fn indirect(address: u32) -> Self {
        Operand {
            address,
            indirect: true,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indirect {
            write!(f, "&{}", self.address)
        } else {
            write!(f, "{}", self.address)
        }
    }
}

/// Binary operators, in semantic-cube axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
    Equals,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    And,
    Or,
}

impl BinOp {
    /// Source-level spelling, also the quadruple opcode.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "**",
            BinOp::Mod => "mod",
            BinOp::Equals => "equals",
            BinOp::Greater => ">",
            BinOp::Less => "<",
            BinOp::GreaterEqual => ">=",
            BinOp::LessEqual => "<=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Unary operators, in unary-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Increment,
    Decrement,
    Plus,
    Minus,
    Not,
}

impl UnOp {
    /// Source-level spelling, used in error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Increment => "++",
            UnOp::Decrement => "--",
            UnOp::Plus => "+",
            UnOp::Minus => "-",
            UnOp::Not => "not",
        }
    }

    /// Quadruple opcode. Unary `+`/`-` are renamed so the VM can tell them
    /// apart from their binary namesakes.
    pub fn opcode(self) -> &'static str {
        match self {
            UnOp::Increment => "++",
            UnOp::Decrement => "--",
            UnOp::Plus => "PLUS",
            UnOp::Minus => "MIN",
            UnOp::Not => "not",
        }
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Built-in functions with a dedicated VM opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialOp {
    Print,
    Println,
    Sqrt,
    Log,
    Random,
    LittleStar,
    NoteA,
    NoteB,
    NoteC,
    NoteD,
    NoteE,
    NoteF,
    NoteG,
    Length,
    Copy,
    Get,
    ToStr,
    Input,
    Floor,
    Ceil,
}

impl SpecialOp {
    /// Reserved identifier in source programs, also the quadruple opcode.
    pub fn name(self) -> &'static str {
        match self {
            SpecialOp::Print => "print",
            SpecialOp::Println => "println",
            SpecialOp::Sqrt => "sqrt",
            SpecialOp::Log => "log",
            SpecialOp::Random => "random",
            SpecialOp::LittleStar => "little_star",
            SpecialOp::NoteA => "A",
            SpecialOp::NoteB => "B",
            SpecialOp::NoteC => "C",
            SpecialOp::NoteD => "D",
            SpecialOp::NoteE => "E",
            SpecialOp::NoteF => "F",
            SpecialOp::NoteG => "G",
            SpecialOp::Length => "length",
            SpecialOp::Copy => "copy",
            SpecialOp::Get => "get",
            SpecialOp::ToStr => "to_str",
            SpecialOp::Input => "input",
            SpecialOp::Floor => "floor",
            SpecialOp::Ceil => "ceil",
        }
    }
}

impl fmt::Display for SpecialOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One instruction of the intermediate representation.
///
/// Jump targets start out as `None` while a structure is still open and are
/// patched to real quad indices before compilation finishes; an unpatched
/// target renders as the bare opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum Quad {
    Binary {
        op: BinOp,
        left: Operand,
        right: Operand,
        dest: Operand,
    },
    Unary {
        op: UnOp,
        src: Operand,
        dest: Operand,
    },
    Assign {
        src: Operand,
        dest: Operand,
    },
    Goto {
        target: Option<usize>,
    },
    Gotof {
        cond: Operand,
        target: Option<usize>,
    },
    Param {
        arg: Operand,
        index: usize,
    },
    Gosub {
        function: String,
    },
    Endproc {
        function: String,
    },
    Ver {
        offset: Operand,
        lower: i64,
        upper: i64,
    },
    Access {
        base: u32,
        offset: Operand,
        dest: Operand,
    },
    Special {
        op: SpecialOp,
        result: Option<Operand>,
    },
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quad::Binary {
                op,
                left,
                right,
                dest,
            } => write!(f, "{} {} {} {}", op.symbol(), left, right, dest),
            Quad::Unary { op, src, dest } => write!(f, "{} {} {}", op.opcode(), src, dest),
            Quad::Assign { src, dest } => write!(f, "= {} {}", src, dest),
            Quad::Goto { target: Some(t) } => write!(f, "GOTO {}", t),
            Quad::Goto { target: None } => write!(f, "GOTO"),
            Quad::Gotof {
                cond,
                target: Some(t),
            } => write!(f, "GOTOF {} {}", cond, t),
            Quad::Gotof { cond, target: None } => write!(f, "GOTOF {}", cond),
            Quad::Param { arg, index } => write!(f, "PARAM {} {}", arg, index),
            Quad::Gosub { function } => write!(f, "GOSUB {}", function),
            Quad::Endproc { function } => write!(f, "ENDPROC {}", function),
            Quad::Ver {
                offset,
                lower,
                upper,
            } => write!(f, "VER {} {} {}", offset, lower, upper),
            Quad::Access { base, offset, dest } => {
                write!(f, "ACCESS {} {} {}", base, offset, dest)
            }
            Quad::Special {
                op,
                result: Some(result),
            } => write!(f, "{} {}", op.name(), result),
            Quad::Special { op, result: None } => write!(f, "{}", op.name()),
        }
    }
}
