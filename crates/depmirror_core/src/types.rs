#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub request: String,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    /// `import ... from 'x'`, `import 'x'` or `export ... from 'x'`
    Static,
    /// `require('x')`
    Require,
    /// `import('x')`
    Dynamic,
}

impl Specifier {
    pub fn new(request: impl Into<String>, kind: SpecKind) -> Self {
        Self { request: request.into(), kind }
    }
}

impl AsRef<str> for Specifier {
    fn as_ref(&self) -> &str {
        &self.request
    }
}
