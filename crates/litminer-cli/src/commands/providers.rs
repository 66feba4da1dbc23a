//! Providers command implementation.

use crate::output::Formatter;

/// Print the provider registry.
pub fn execute_providers(formatter: &Formatter) {
    println!("{}", formatter.providers_table(litminer_llm::supported_providers()));
}
