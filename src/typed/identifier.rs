use std::str::FromStr;

/// A resource identifier carried in a single path segment.
///
/// Typed routes that take an identifier append `/:id` to their path and
/// build the identifier from that segment:
///
/// ```rust
/// use weft::{Identifier, IdentifierError};
///
/// struct Sku(String);
///
/// impl Identifier for Sku {
///     fn from_segment(segment: &str) -> Result<Self, IdentifierError> {
///         if segment.starts_with("SKU-") {
///             Ok(Sku(segment.to_owned()))
///         } else {
///             Err(IdentifierError::new::<Self>(segment))
///         }
///     }
///
///     fn value(&self) -> String { self.0.clone() }
/// }
/// ```
pub trait Identifier: Sized + Send + 'static {
    fn from_segment(segment: &str) -> Result<Self, IdentifierError>;

    /// The segment form, used for `Location` headers and tagged arrays.
    fn value(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
#[error("`{segment}` is not a valid {target}")]
pub struct IdentifierError {
    segment: String,
    target: &'static str,
}

impl IdentifierError {
    pub fn new<T: ?Sized>(segment: &str) -> Self {
        Self { segment: segment.to_owned(), target: std::any::type_name::<T>() }
    }
}

macro_rules! identifier_from_str {
    ($($ty:ty),* $(,)?) => {$(
        impl Identifier for $ty {
            fn from_segment(segment: &str) -> Result<Self, IdentifierError> {
                <$ty as FromStr>::from_str(segment).map_err(|_| IdentifierError::new::<$ty>(segment))
            }

            fn value(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

identifier_from_str!(i16, i32, i64, u16, u32, u64, usize, String);
