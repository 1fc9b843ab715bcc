// Benchmark selection from command-line names

use crate::domain::workload::WORKLOAD_PREFIX;
use crate::domain::Workload;

/// Outcome of matching requested names against discovered workloads
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Matched workloads in discovery order
    pub selected: Vec<Workload>,
    /// Requested names (normalized) that matched nothing
    pub unknown: Vec<String>,
}

/// Add the `test_` prefix to the final path component when missing
///
/// `fibonacci` -> `test_fibonacci`, `cpu/recursive/fibonacci` ->
/// `cpu/recursive/test_fibonacci`
pub fn normalize_name(name: &str) -> String {
    let name = name.trim().trim_end_matches(".py");
    let (dir, file) = match name.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, name),
    };
    let file = if file.starts_with(WORKLOAD_PREFIX) {
        file.to_string()
    } else {
        format!("{WORKLOAD_PREFIX}{file}")
    };
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    }
}

/// Select workloads by name; an empty request selects everything
///
/// A name matches a workload whose full id or short name equals it.
pub fn select_workloads(available: &[Workload], requested: &[String]) -> Selection {
    if requested.is_empty() {
        return Selection {
            selected: available.to_vec(),
            unknown: Vec::new(),
        };
    }

    let names: Vec<String> = requested.iter().map(|n| normalize_name(n)).collect();
    let matches = |w: &Workload, name: &str| w.id.as_str() == name || w.short_name() == name;

    let selected = available
        .iter()
        .filter(|w| names.iter().any(|n| matches(w, n)))
        .cloned()
        .collect();

    let mut unknown: Vec<String> = Vec::new();
    for name in names {
        if !available.iter().any(|w| matches(w, &name)) && !unknown.contains(&name) {
            unknown.push(name);
        }
    }

    Selection { selected, unknown }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WorkloadKind;
    use crate::port::workload_catalog::mocks::StaticCatalog;
    use crate::port::WorkloadCatalog;

    fn workloads(ids: &[&str]) -> Vec<Workload> {
        StaticCatalog::from_ids(WorkloadKind::Timing, ids)
            .discover(WorkloadKind::Timing)
            .unwrap()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("fibonacci"), "test_fibonacci");
        assert_eq!(normalize_name("test_fibonacci"), "test_fibonacci");
        assert_eq!(
            normalize_name("cpu/recursive/fibonacci"),
            "cpu/recursive/test_fibonacci"
        );
        assert_eq!(normalize_name("test_fibonacci.py"), "test_fibonacci");
    }

    #[test]
    fn test_empty_request_selects_all() {
        let all = workloads(&["cpu/recursive/test_fibonacci", "test_startup"]);
        let selection = select_workloads(&all, &[]);
        assert_eq!(selection.selected, all);
        assert!(selection.unknown.is_empty());
    }

    #[test]
    fn test_matches_short_and_full_names_in_discovery_order() {
        let all = workloads(&[
            "cpu/recursive/test_fibonacci",
            "cpu/arithmetic/test_matrix_multiply",
            "object/dict/test_dict_operations",
        ]);
        let requested = vec![
            "object/dict/test_dict_operations".to_string(),
            "fibonacci".to_string(),
            "nonexistent".to_string(),
        ];
        let selection = select_workloads(&all, &requested);

        let ids: Vec<_> = selection.selected.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["cpu/recursive/test_fibonacci", "object/dict/test_dict_operations"]
        );
        assert_eq!(selection.unknown, vec!["test_nonexistent".to_string()]);
    }

    #[test]
    fn test_unknown_names_reported_once() {
        let all = workloads(&["cpu/recursive/test_fibonacci"]);
        let requested: Vec<String> = ["missing", "fibonacci", "other", "test_missing.py"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let selection = select_workloads(&all, &requested);

        assert_eq!(selection.selected.len(), 1);
        assert_eq!(
            selection.unknown,
            vec!["test_missing".to_string(), "test_other".to_string()]
        );
    }
}
