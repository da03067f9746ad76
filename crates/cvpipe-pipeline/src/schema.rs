use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::TransformError;

/// The type and valid range of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// An integer in `[min, max]`, optionally restricted to odd values.
    Int {
        /// The smallest valid value.
        min: i64,
        /// The largest valid value.
        max: i64,
        /// Only odd values are valid.
        odd: bool,
    },
    /// A finite number in `[min, max]`.
    Float {
        /// The smallest valid value.
        min: f64,
        /// The largest valid value.
        max: f64,
    },
    /// A boolean flag.
    Bool,
    /// One of an enumerated set of names.
    Choice(Vec<String>),
    /// A `[width, height]` pair with both sides in `[min, max]`.
    ///
    /// A single number stands for a square size.
    Size {
        /// The smallest valid side.
        min: usize,
        /// The largest valid side.
        max: usize,
        /// Only odd sides are valid.
        odd: bool,
    },
    /// A list of `len` numbers, each in `[min, max]`.
    Vector {
        /// The number of elements.
        len: usize,
        /// The smallest valid element.
        min: f64,
        /// The largest valid element.
        max: f64,
    },
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let odd = |odd: &bool| if *odd { " odd" } else { "" };
        match self {
            ParamKind::Int { min, max, odd: o } => write!(f, "int{} in [{min}, {max}]", odd(o)),
            ParamKind::Float { min, max } => write!(f, "float in [{min}, {max}]"),
            ParamKind::Bool => write!(f, "bool"),
            ParamKind::Choice(choices) => write!(f, "one of {}", choices.join("|")),
            ParamKind::Size { min, max, odd: o } => {
                write!(f, "[w, h]{} in [{min}, {max}]", odd(o))
            }
            ParamKind::Vector { len, min, max } => write!(f, "{len} floats in [{min}, {max}]"),
        }
    }
}

/// A validated parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// An integer.
    Int(i64),
    /// A number.
    Float(f64),
    /// A flag.
    Bool(bool),
    /// A choice name.
    Choice(String),
    /// A `(width, height)` pair.
    Size(usize, usize),
    /// A list of numbers.
    Vector(Vec<f64>),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Choice(v) => write!(f, "{v}"),
            ParamValue::Size(w, h) => write!(f, "[{w}, {h}]"),
            ParamValue::Vector(v) => write!(f, "{v:?}"),
        }
    }
}

/// The declaration of one parameter of a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// The parameter name.
    pub name: String,
    /// The type and range.
    pub kind: ParamKind,
    /// The value used when the step does not set the parameter.
    pub default: ParamValue,
}

impl ParamSpec {
    /// An integer parameter.
    pub fn int(name: &str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Int {
                min,
                max,
                odd: false,
            },
            default: ParamValue::Int(default),
        }
    }

    /// A number parameter.
    pub fn float(name: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Float { min, max },
            default: ParamValue::Float(default),
        }
    }

    /// A flag parameter.
    pub fn bool(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Bool,
            default: ParamValue::Bool(default),
        }
    }

    /// A parameter taking one of `choices`.
    pub fn choice(name: &str, choices: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Choice(choices.iter().map(|c| c.to_string()).collect()),
            default: ParamValue::Choice(default.to_string()),
        }
    }

    /// A `[width, height]` parameter.
    pub fn size(name: &str, min: usize, max: usize, default: (usize, usize)) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Size {
                min,
                max,
                odd: false,
            },
            default: ParamValue::Size(default.0, default.1),
        }
    }

    /// A fixed length list of numbers.
    pub fn vector(name: &str, min: f64, max: f64, default: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Vector {
                len: default.len(),
                min,
                max,
            },
            default: ParamValue::Vector(default.to_vec()),
        }
    }

    /// Restrict an integer or size parameter to odd values.
    pub fn odd(mut self) -> Self {
        match &mut self.kind {
            ParamKind::Int { odd, .. } | ParamKind::Size { odd, .. } => *odd = true,
            _ => {}
        }
        self
    }

    /// Check a raw configuration value against the declaration.
    ///
    /// Integers are accepted where numbers are expected, and numbers without a
    /// fractional part where integers are expected.
    pub fn coerce(&self, raw: &Value) -> Result<ParamValue, String> {
        match &self.kind {
            ParamKind::Int { min, max, odd } => {
                let v = as_integer(raw)?;
                if v < *min || v > *max {
                    return Err(format!("{v} is outside of [{min}, {max}]"));
                }
                if *odd && v % 2 == 0 {
                    return Err(format!("{v} must be odd"));
                }
                Ok(ParamValue::Int(v))
            }
            ParamKind::Float { min, max } => {
                let v = as_number(raw)?;
                if v < *min || v > *max {
                    return Err(format!("{v} is outside of [{min}, {max}]"));
                }
                Ok(ParamValue::Float(v))
            }
            ParamKind::Bool => raw
                .as_bool()
                .map(ParamValue::Bool)
                .ok_or_else(|| format!("expected a boolean, got {raw}")),
            ParamKind::Choice(choices) => {
                let v = raw
                    .as_str()
                    .ok_or_else(|| format!("expected a string, got {raw}"))?;
                if choices.iter().any(|c| c == v) {
                    Ok(ParamValue::Choice(v.to_string()))
                } else {
                    Err(format!("`{v}` is not one of {}", choices.join(", ")))
                }
            }
            ParamKind::Size { min, max, odd } => {
                let (w, h) = match raw {
                    Value::Array(items) if items.len() == 2 => {
                        (as_integer(&items[0])?, as_integer(&items[1])?)
                    }
                    Value::Number(_) => {
                        let v = as_integer(raw)?;
                        (v, v)
                    }
                    _ => return Err(format!("expected [width, height], got {raw}")),
                };
                for side in [w, h] {
                    if side < *min as i64 || side > *max as i64 {
                        return Err(format!("{side} is outside of [{min}, {max}]"));
                    }
                    if *odd && side % 2 == 0 {
                        return Err(format!("{side} must be odd"));
                    }
                }
                Ok(ParamValue::Size(w as usize, h as usize))
            }
            ParamKind::Vector { len, min, max } => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| format!("expected a list of {len} numbers, got {raw}"))?;
                if items.len() != *len {
                    return Err(format!("expected {len} numbers, got {}", items.len()));
                }
                let values = items.iter().map(as_number).collect::<Result<Vec<_>, _>>()?;
                if let Some(v) = values.iter().find(|&&v| v < *min || v > *max) {
                    return Err(format!("{v} is outside of [{min}, {max}]"));
                }
                Ok(ParamValue::Vector(values))
            }
        }
    }
}

fn as_number(raw: &Value) -> Result<f64, String> {
    raw.as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("expected a number, got {raw}"))
}

fn as_integer(raw: &Value) -> Result<i64, String> {
    if let Some(v) = raw.as_i64() {
        return Ok(v);
    }
    let v = as_number(raw)?;
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Ok(v as i64)
    } else {
        Err(format!("expected an integer, got {raw}"))
    }
}

/// The declaration of a transform: its parameters and the images it takes.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSpec {
    /// A one line description.
    pub description: String,
    /// The parameters, in declaration order.
    pub params: Vec<ParamSpec>,
    /// The minimum number of input images.
    pub min_inputs: usize,
    /// The maximum number of input images.
    pub max_inputs: usize,
    /// The minimum `(width, height)` of every input image.
    pub min_size: Option<(usize, usize)>,
}

impl TransformSpec {
    /// A transform with a single input and no parameters.
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            params: Vec::new(),
            min_inputs: 1,
            max_inputs: 1,
            min_size: None,
        }
    }

    /// Declare a parameter.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Declare the number of inputs.
    pub fn inputs(mut self, min: usize, max: usize) -> Self {
        self.min_inputs = min;
        self.max_inputs = max;
        self
    }

    /// Declare the minimum size of the inputs.
    pub fn min_size(mut self, width: usize, height: usize) -> Self {
        self.min_size = Some((width, height));
        self
    }

    /// Find a parameter declaration by name.
    pub fn find_param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// The resolved parameters handed to a transform.
///
/// Every declared parameter is present, either from the step or from its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    /// Create an empty set of parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn insert(&mut self, name: &str, value: ParamValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Get a parameter.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Iterate over the parameters sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn missing(name: &str, expected: &str) -> TransformError {
        TransformError::InvalidArgument(format!("parameter `{name}` is not a declared {expected}"))
    }

    /// Get an integer parameter.
    pub fn int(&self, name: &str) -> Result<i64, TransformError> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => Ok(*v),
            _ => Err(Self::missing(name, "integer")),
        }
    }

    /// Get a non negative integer parameter.
    pub fn usize(&self, name: &str) -> Result<usize, TransformError> {
        let v = self.int(name)?;
        usize::try_from(v)
            .map_err(|_| TransformError::InvalidArgument(format!("`{name}` is negative: {v}")))
    }

    /// Get a number parameter.
    pub fn float(&self, name: &str) -> Result<f32, TransformError> {
        match self.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v as f32),
            Some(ParamValue::Int(v)) => Ok(*v as f32),
            _ => Err(Self::missing(name, "number")),
        }
    }

    /// Get a flag parameter.
    pub fn bool(&self, name: &str) -> Result<bool, TransformError> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            _ => Err(Self::missing(name, "flag")),
        }
    }

    /// Get a choice parameter.
    pub fn choice(&self, name: &str) -> Result<&str, TransformError> {
        match self.get(name) {
            Some(ParamValue::Choice(v)) => Ok(v.as_str()),
            _ => Err(Self::missing(name, "choice")),
        }
    }

    /// Get a size parameter as `(width, height)`.
    pub fn size(&self, name: &str) -> Result<(usize, usize), TransformError> {
        match self.get(name) {
            Some(ParamValue::Size(w, h)) => Ok((*w, *h)),
            _ => Err(Self::missing(name, "size")),
        }
    }

    /// Get a list parameter with exactly `N` elements.
    pub fn vector<const N: usize>(&self, name: &str) -> Result<[f32; N], TransformError> {
        match self.get(name) {
            Some(ParamValue::Vector(v)) if v.len() == N => {
                let mut out = [0.0f32; N];
                out.iter_mut().zip(v.iter()).for_each(|(o, &x)| *o = x as f32);
                Ok(out)
            }
            _ => Err(Self::missing(name, "list")),
        }
    }

    /// Get a list parameter as pairs of points.
    pub fn points<const N: usize>(&self, name: &str) -> Result<[(f32, f32); N], TransformError> {
        match self.get(name) {
            Some(ParamValue::Vector(v)) if v.len() == 2 * N => {
                let mut out = [(0.0f32, 0.0f32); N];
                out.iter_mut()
                    .zip(v.chunks_exact(2))
                    .for_each(|(o, p)| *o = (p[0] as f32, p[1] as f32));
                Ok(out)
            }
            _ => Err(Self::missing(name, "list of points")),
        }
    }
}
