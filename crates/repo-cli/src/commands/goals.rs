//! Goal listing

use super::registry;

/// Print every registered goal name, one per line.
pub fn run_goals() {
    for goal in registry().goals() {
        println!("{goal}");
    }
}
