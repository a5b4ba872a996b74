//! Parsers for OmniSwitch CLI output, one module per command family.
//!
//! Every parser is a pure function from text to typed records. Switch
//! output is adversarial input: firmware lines differ (AOS6 vs AOS8 vs
//! OS6860 layouts), fields go missing, values carry trailing commas.
//! Parsers therefore never fail — they extract what they can and leave the
//! rest empty or zero. I/O errors belong to the executor, not here.

/// Compile a built-in pattern. Parser patterns are string literals, so a
/// failure here is a programming error caught by the module tests.
pub(crate) fn static_regex(pattern: &str) -> regex::Regex {
    regex::Regex::new(pattern)
        .unwrap_or_else(|e| panic!("built-in parser pattern must be valid regex: {e}"))
}

pub mod dhcp;
pub mod environment;
pub mod health;
pub mod interface;
pub mod lacp;
pub mod lanpower;
pub mod lldp;
pub mod mac;
pub mod ntp;
pub mod routing;
pub mod stp;
pub mod system;
pub mod vlan;
