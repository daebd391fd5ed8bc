//! Instruction set and decoder for the toy per-process programs.
//!
//! An instruction line is a verb plus whitespace-separated operands. The
//! decoder produces a closed tagged enumeration; unknown verbs and resource
//! names are typed decode errors, reported by the interpreter and never
//! fatal.

use std::fmt;

use crate::resource::ResourceId;

/// A decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    /// Emit the value of a variable.
    Print { var: String },
    /// Bind a variable to a resolved value.
    Assign { var: String, value: AssignValue },
    /// Write one variable's value to the file named by another variable.
    WriteFile { file_var: String, data_var: String },
    /// Stream every line of the file named by a variable to the output sink.
    ReadFile { file_var: String },
    /// Emit an inclusive integer range resolved from two variables.
    PrintFromTo { from_var: String, to_var: String },
    Wait { resource: ResourceId },
    Signal { resource: ResourceId },
}

/// Right-hand side of an `assign`.
///
/// Multi-word literals are preserved: the operand tail is recombined with
/// single spaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignValue {
    Literal(String),
    /// The literal value `input`: read one line interactively.
    Input,
    /// The `readFile` marker: the named variable holds a filename whose
    /// first line becomes the value.
    FirstLineOf { file_var: String },
}

/// Typed decode failure. Reported to the output sink; execution continues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    Empty,
    UnknownVerb(String),
    MissingOperand { verb: &'static str },
    UnknownResource(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => f.write_str("Empty instruction line."),
            DecodeError::UnknownVerb(verb) => write!(f, "Unknown instruction: {verb}"),
            DecodeError::MissingOperand { verb } => write!(f, "Missing operand for '{verb}'."),
            DecodeError::UnknownResource(name) => write!(f, "Unknown resource: {name}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode one instruction line.
pub fn decode(line: &str) -> Result<Instr, DecodeError> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().ok_or(DecodeError::Empty)?;

    match verb {
        "print" => {
            let var = operand(&mut tokens, "print")?;
            Ok(Instr::Print { var })
        }
        "assign" => {
            let var = operand(&mut tokens, "assign")?;
            let tail: Vec<&str> = tokens.collect();
            if tail.is_empty() {
                return Err(DecodeError::MissingOperand { verb: "assign" });
            }
            let value = decode_assign_value(&tail)?;
            Ok(Instr::Assign { var, value })
        }
        "writeFile" => {
            let file_var = operand(&mut tokens, "writeFile")?;
            let data_var = operand(&mut tokens, "writeFile")?;
            Ok(Instr::WriteFile { file_var, data_var })
        }
        "readFile" => {
            let file_var = operand(&mut tokens, "readFile")?;
            Ok(Instr::ReadFile { file_var })
        }
        "printFromTo" => {
            let from_var = operand(&mut tokens, "printFromTo")?;
            let to_var = operand(&mut tokens, "printFromTo")?;
            Ok(Instr::PrintFromTo { from_var, to_var })
        }
        "semWait" => {
            let resource = resource_operand(&mut tokens, "semWait")?;
            Ok(Instr::Wait { resource })
        }
        "semSignal" => {
            let resource = resource_operand(&mut tokens, "semSignal")?;
            Ok(Instr::Signal { resource })
        }
        other => Err(DecodeError::UnknownVerb(other.to_string())),
    }
}

fn operand<'a, I: Iterator<Item = &'a str>>(
    tokens: &mut I,
    verb: &'static str,
) -> Result<String, DecodeError> {
    tokens
        .next()
        .map(str::to_string)
        .ok_or(DecodeError::MissingOperand { verb })
}

fn resource_operand<'a, I: Iterator<Item = &'a str>>(
    tokens: &mut I,
    verb: &'static str,
) -> Result<ResourceId, DecodeError> {
    let name = operand(tokens, verb)?;
    ResourceId::parse(&name).ok_or(DecodeError::UnknownResource(name))
}

fn decode_assign_value(tail: &[&str]) -> Result<AssignValue, DecodeError> {
    if tail == ["input"] {
        return Ok(AssignValue::Input);
    }
    if tail[0] == "readFile" {
        if tail.len() < 2 {
            return Err(DecodeError::MissingOperand { verb: "assign" });
        }
        return Ok(AssignValue::FirstLineOf {
            file_var: tail[1..].join(" "),
        });
    }
    Ok(AssignValue::Literal(tail.join(" ")))
}
