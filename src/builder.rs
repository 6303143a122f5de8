use crate::generator::{Generator, Object};
use crate::value::{Complex, Scalar};

impl Object {
    /// Add a field. Repeated names merge exactly as repeated
    /// assignments do when parsing.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Into<Generator>) -> Self {
        self.add(name, value.into());
        self
    }

    /// Add a field at a dotted path, e.g. `metadata.labels.app`.
    #[must_use]
    pub fn path(self, path: &str, value: impl Into<Generator>) -> Self {
        let mut segments: Vec<&str> = path.split('.').collect();
        let head = segments.remove(0);
        let nested = segments
            .into_iter()
            .rev()
            .fold(value.into(), |inner, segment| {
                Generator::Object(Self::single(segment, inner))
            });
        self.field(head, nested)
    }
}

impl Generator {
    /// Null scalar.
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// Array of the given items, order preserved.
    #[must_use]
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Scalar> for Generator {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<Object> for Generator {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<Vec<Self>> for Generator {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

impl From<bool> for Generator {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<i32> for Generator {
    fn from(n: i32) -> Self {
        Self::Scalar(Scalar::Int(i64::from(n)))
    }
}

impl From<i64> for Generator {
    fn from(n: i64) -> Self {
        Self::Scalar(Scalar::Int(n))
    }
}

impl From<f64> for Generator {
    fn from(x: f64) -> Self {
        Self::Scalar(Scalar::Float(x))
    }
}

impl From<Complex> for Generator {
    fn from(c: Complex) -> Self {
        Self::Scalar(Scalar::Complex(c))
    }
}

impl From<&str> for Generator {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Generator {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::String(s))
    }
}
