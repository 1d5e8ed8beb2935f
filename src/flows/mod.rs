//! Built-in flow scripts

pub mod install;

use crate::common::{Error, Result};
use crate::runner::Flow;

pub use install::InstallFlow;

/// Every flow shipped with the binary
pub fn builtin() -> Vec<Box<dyn Flow>> {
    vec![Box::new(InstallFlow::default())]
}

/// Look a built-in flow up by name
pub fn find(name: &str) -> Result<Box<dyn Flow>> {
    let mut flows = builtin();
    let available = flows
        .iter()
        .map(|f| f.name().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    match flows.iter().position(|f| f.name() == name) {
        Some(index) => Ok(flows.swap_remove(index)),
        None => Err(Error::UnknownFlow {
            name: name.to_string(),
            available,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_builtin() {
        assert_eq!(find("install").unwrap().name(), "install");
    }

    #[test]
    fn test_unknown_flow_lists_available() {
        let err = find("uninstall-everything").err().unwrap();
        assert!(err.to_string().contains("Available: install"));
    }
}
