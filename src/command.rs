use std::{fmt, str::FromStr};

use crate::{config::LINE_TERMINATOR, setpoint::{Setpoint, SetpointError}};

/// Field tag for the target
pub const TARGET_TAG: &str = "SP";
/// Field tag for the maximum
pub const MAXIMUM_TAG: &str = "SM";
/// Field tag for the minimum
pub const MINIMUM_TAG: &str = "Sm";

/// A single line sent to the microcontroller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command{
    /// `SP:<target>,SM:<maximum>,Sm:<minimum>`
    Setpoint(Setpoint),
    /// Free-form text typed by the operator
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError{
    Empty,
    MissingField(&'static str),
    DuplicateField(String),
    UnknownField(String),
    BadValue{field: String, value: String},
    Setpoint(SetpointError),
}

impl fmt::Display for CommandError{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self{
            CommandError::Empty => write!(f, "empty command"),
            CommandError::MissingField(tag) => write!(f, "missing field {}", tag),
            CommandError::DuplicateField(tag) => write!(f, "field {} given twice", tag),
            CommandError::UnknownField(part) => write!(f, "unknown field '{}'", part),
            CommandError::BadValue{field, value} => write!(f, "field {} has non integer value '{}'", field, value),
            CommandError::Setpoint(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CommandError{}

impl From<SetpointError> for CommandError{
    fn from(e: SetpointError) -> Self {
        CommandError::Setpoint(e)
    }
}

impl Command{
    /// Wraps operator text, refusing blank input. Surrounding whitespace is dropped.
    pub fn custom(text: &str) -> Result<Command, CommandError> {
        let text = text.trim();
        if text.is_empty(){
            return Err(CommandError::Empty);
        }
        Ok(Command::Custom(text.to_string()))
    }

    /// The command text without the terminator
    pub fn wire(&self) -> String {
        match self{
            Command::Setpoint(sp) => format!("{}:{},{}:{},{}:{}", TARGET_TAG, sp.target(), MAXIMUM_TAG, sp.maximum(), MINIMUM_TAG, sp.minimum()),
            Command::Custom(text) => text.clone(),
        }
    }

    /// The exact bytes written to the device
    pub fn encode(&self) -> String {
        let mut line = self.wire();
        line.push_str(LINE_TERMINATOR);
        line
    }
}

impl fmt::Display for Command{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}

impl From<Setpoint> for Command{
    fn from(sp: Setpoint) -> Self {
        Command::Setpoint(sp)
    }
}

/// Quick format check used before free text is pushed from the console
pub fn looks_like_setpoint(text: &str) -> bool {
    [TARGET_TAG, MAXIMUM_TAG, MINIMUM_TAG].iter().all(|tag| text.contains(&format!("{}:", tag)))
}

impl FromStr for Setpoint{
    type Err = CommandError;

    /// Decodes `SP:20,SM:21,Sm:19`. Field order does not matter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty(){
            return Err(CommandError::Empty);
        }
        let mut target = None;
        let mut maximum = None;
        let mut minimum = None;

        for part in s.split(','){
            let (tag, value) = match part.trim().split_once(':'){
                Some(kv) => kv,
                None => return Err(CommandError::UnknownField(part.trim().to_string())),
            };
            let slot = match tag.trim(){
                TARGET_TAG => &mut target,
                MAXIMUM_TAG => &mut maximum,
                MINIMUM_TAG => &mut minimum,
                other => return Err(CommandError::UnknownField(other.to_string())),
            };
            if slot.is_some(){
                return Err(CommandError::DuplicateField(tag.trim().to_string()));
            }
            let parsed = value.trim().parse::<i32>().map_err(|_| CommandError::BadValue{
                field: tag.trim().to_string(),
                value: value.trim().to_string(),
            })?;
            *slot = Some(parsed);
        }

        let target = target.ok_or(CommandError::MissingField(TARGET_TAG))?;
        let maximum = maximum.ok_or(CommandError::MissingField(MAXIMUM_TAG))?;
        let minimum = minimum.ok_or(CommandError::MissingField(MINIMUM_TAG))?;
        Ok(Setpoint::new(target, minimum, maximum)?)
    }
}
