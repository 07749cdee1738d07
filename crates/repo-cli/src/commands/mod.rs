//! Command implementations

mod apply;
mod goals;
mod list;

pub use apply::run_apply;
pub use goals::run_goals;
pub use list::run_list;

use repo_policy::GoalRegistry;

/// Registry with every built-in service.
pub fn registry() -> GoalRegistry {
    GoalRegistry::with_bundles([repo_hosting::bundle(), repo_ci::bundle()])
}
