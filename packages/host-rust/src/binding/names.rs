use objbridge_core::to_camel_case;

/// Turns declared member names into script-visible names.
pub trait NameConverter: Send + Sync {
    fn convert(&self, declared: &str) -> String;
}

/// Lower camel case (`get_value` -> `getValue`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseNameConverter;

impl NameConverter for CamelCaseNameConverter {
    fn convert(&self, declared: &str) -> String {
        to_camel_case(declared)
    }
}

/// Names exposed exactly as declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsDeclaredNameConverter;

impl NameConverter for AsDeclaredNameConverter {
    fn convert(&self, declared: &str) -> String {
        declared.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converters() {
        assert_eq!(CamelCaseNameConverter.convert("max_items"), "maxItems");
        assert_eq!(AsDeclaredNameConverter.convert("max_items"), "max_items");
    }
}
