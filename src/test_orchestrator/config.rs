//! `TestConfig` and the dependency-graph validation that runs before any
//! test is scheduled (spec.md §4.4, §3 "Test Configuration").

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    pub name: String,
    pub command: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub cwd: Option<String>,
}

fn default_timeout() -> u64 {
    300
}

/// Topologically order `plan`, erroring on cycles or unknown dependency
/// names (spec.md §4.4 "Dependency cycle detected at submission").
pub fn topo_order(plan: &[TestConfig]) -> Result<Vec<usize>> {
    let index_of: HashMap<&str, usize> = plan.iter().enumerate().map(|(i, t)| (t.name.as_str(), i)).collect();

    for test in plan {
        if test.timeout_seconds == 0 {
            return Err(EngineError::InvalidTestPlan {
                reason: format!("test '{}' has timeout_seconds = 0", test.name),
            });
        }
        for dep in &test.depends_on {
            if !index_of.contains_key(dep.as_str()) {
                return Err(EngineError::InvalidTestPlan {
                    reason: format!("test '{}' depends on unknown test '{dep}'", test.name),
                });
            }
        }
    }

    let mut order = Vec::with_capacity(plan.len());
    let mut visited = vec![0u8; plan.len()]; // 0 = unvisited, 1 = in-progress, 2 = done
    let mut in_progress_stack: Vec<usize> = Vec::new();

    fn visit(
        i: usize,
        plan: &[TestConfig],
        index_of: &HashMap<&str, usize>,
        visited: &mut [u8],
        order: &mut Vec<usize>,
        stack: &mut Vec<usize>,
    ) -> Result<()> {
        match visited[i] {
            2 => return Ok(()),
            1 => {
                return Err(EngineError::InvalidTestPlan {
                    reason: format!("dependency cycle involving '{}'", plan[i].name),
                });
            }
            _ => {}
        }
        visited[i] = 1;
        stack.push(i);
        for dep in &plan[i].depends_on {
            let j = index_of[dep.as_str()];
            visit(j, plan, index_of, visited, order, stack)?;
        }
        stack.pop();
        visited[i] = 2;
        order.push(i);
        Ok(())
    }

    for i in 0..plan.len() {
        visit(i, plan, &index_of, &mut visited, &mut order, &mut in_progress_stack)?;
    }

    Ok(order)
}

/// Validate that no two tests share a name, grounded in `HashSet` uniqueness
/// check style used throughout the store layer.
pub fn validate_unique_names(plan: &[TestConfig]) -> Result<()> {
    let mut seen = HashSet::new();
    for test in plan {
        if !seen.insert(test.name.as_str()) {
            return Err(EngineError::InvalidTestPlan {
                reason: format!("duplicate test name '{}'", test.name),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(name: &str, deps: &[&str]) -> TestConfig {
        TestConfig {
            name: name.to_string(),
            command: vec!["true".to_string()],
            timeout_seconds: 10,
            depends_on: deps.iter().map(|s| s.to_string()).collect(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    #[test]
    fn linear_chain_orders_dependencies_first() {
        let plan = vec![cfg("c", &["b"]), cfg("b", &["a"]), cfg("a", &[])];
        let order = topo_order(&plan).unwrap();
        let names: Vec<&str> = order.iter().map(|&i| plan[i].name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_is_rejected() {
        let plan = vec![cfg("a", &["b"]), cfg("b", &["a"])];
        let err = topo_order(&plan).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTestPlan { .. }));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let plan = vec![cfg("a", &["ghost"])];
        let err = topo_order(&plan).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTestPlan { .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut plan = vec![cfg("a", &[])];
        plan[0].timeout_seconds = 0;
        let err = topo_order(&plan).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTestPlan { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let plan = vec![cfg("a", &[]), cfg("a", &[])];
        let err = validate_unique_names(&plan).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTestPlan { .. }));
    }
}
