use serde::{Deserialize, Serialize};

/// One element of an untyped play argument list.
///
/// Hosts hand over whatever their scripting layer produced, so an element
/// may be text that still needs numeric conversion, a number, or something
/// that is neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    List(Vec<ArgValue>),
    Nil,
}

/// Why an element could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    /// Text that does not parse as a number.
    Format(String),
    /// Neither text nor a number.
    WrongType(&'static str),
}

impl ArgValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ArgValue::Int(_) => "integer",
            ArgValue::Float(_) => "float",
            ArgValue::Text(_) => "text",
            ArgValue::Bool(_) => "boolean",
            ArgValue::List(_) => "list",
            ArgValue::Nil => "nil",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Float value of a number or numeric text. Surrounding whitespace in
    /// text is ignored.
    pub fn to_f32(&self) -> Result<f32, NumericError> {
        match self {
            ArgValue::Int(v) => Ok(*v as f32),
            ArgValue::Float(v) => Ok(*v as f32),
            ArgValue::Text(s) => s
                .trim()
                .parse::<f32>()
                .map_err(|_| NumericError::Format(s.clone())),
            other => Err(NumericError::WrongType(other.kind())),
        }
    }

    /// Integer value of a number or integer text. Floats truncate toward
    /// zero; text must be an integer literal.
    pub fn to_i32(&self) -> Result<i32, NumericError> {
        match self {
            ArgValue::Int(v) => Ok(*v as i32),
            ArgValue::Float(v) => Ok(*v as i32),
            ArgValue::Text(s) => s
                .parse::<i32>()
                .map_err(|_| NumericError::Format(s.clone())),
            other => Err(NumericError::WrongType(other.kind())),
        }
    }

    /// Classify a command-line word: integer, then float, else text.
    pub fn from_word(word: &str) -> Self {
        if let Ok(v) = word.parse::<i64>() {
            ArgValue::Int(v)
        } else if let Ok(v) = word.parse::<f64>() {
            ArgValue::Float(v)
        } else {
            ArgValue::Text(word.to_string())
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Text(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Text(s)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}
