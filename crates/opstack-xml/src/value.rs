//! Scalar text conversions.

use opstack_readwrite::ReadWriteError;

/// A scalar that can be read from node text.
pub trait Readable: Sized {
    /// Parse the node text.
    fn from_text(text: &str) -> Result<Self, ReadWriteError>;
}

/// A scalar that can be written as node text.
pub trait Writable {
    /// Render the node text.
    fn to_text(&self) -> String;
}

impl Readable for String {
    fn from_text(text: &str) -> Result<Self, ReadWriteError> {
        Ok(text.to_owned())
    }
}

impl Writable for String {
    fn to_text(&self) -> String {
        self.clone()
    }
}

impl Writable for str {
    fn to_text(&self) -> String {
        self.to_owned()
    }
}

impl Readable for bool {
    fn from_text(text: &str) -> Result<Self, ReadWriteError> {
        match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ReadWriteError::invalid(other, "bool")),
        }
    }
}

impl Writable for bool {
    fn to_text(&self) -> String {
        let text = if *self { "true" } else { "false" };
        text.to_owned()
    }
}

macro_rules! integer_value {
    ($($ty:ty),*) => {
        $(
            impl Readable for $ty {
                fn from_text(text: &str) -> Result<Self, ReadWriteError> {
                    let text = text.trim();
                    text.parse().map_err(|_| ReadWriteError::invalid(text, stringify!($ty)))
                }
            }

            impl Writable for $ty {
                fn to_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_value!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! float_value {
    ($($ty:ty),*) => {
        $(
            impl Readable for $ty {
                fn from_text(text: &str) -> Result<Self, ReadWriteError> {
                    let text = text.trim();
                    text.parse().map_err(|_| ReadWriteError::invalid(text, stringify!($ty)))
                }
            }

            impl Writable for $ty {
                fn to_text(&self) -> String {
                    if self.is_nan() {
                        "NaN".to_owned()
                    } else if self.is_infinite() {
                        let text = if self.is_sign_positive() { "Infinity" } else { "-Infinity" };
                        text.to_owned()
                    } else {
                        self.to_string()
                    }
                }
            }
        )*
    };
}

float_value!(f32, f64);
