use std::path::Path;

use crate::output;
use crate::store::Store;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    let stats = store.engine.stats();

    if json {
        return output::print_json(&stats);
    }

    println!("Workflows started:    {}", stats.total_workflows);
    println!("Active:               {}", stats.active_workflows);
    println!("Completed:            {}", stats.completed_workflows);
    println!("Transitions recorded: {}", stats.total_transitions);
    Ok(())
}
