//! Pair batching shared by the HTTP cross-encoders.
//!
//! Rerank endpoints take one query and many passages, so pairs are grouped
//! by query and the per-group scores are scattered back to pair order.

use docent_core::error::{DocentError, DocentResult};

/// Pairs sharing one query.
#[derive(Debug, PartialEq)]
pub(crate) struct QueryGroup<'a> {
    pub query: &'a str,
    pub texts: Vec<&'a str>,
    pub positions: Vec<usize>,
}

/// Group pairs by query, in order of first appearance.
pub(crate) fn group_by_query(pairs: &[(String, String)]) -> Vec<QueryGroup<'_>> {
    let mut groups: Vec<QueryGroup<'_>> = Vec::new();
    for (pos, (query, text)) in pairs.iter().enumerate() {
        match groups.iter_mut().find(|g| g.query == query.as_str()) {
            Some(group) => {
                group.texts.push(text.as_str());
                group.positions.push(pos);
            }
            None => groups.push(QueryGroup {
                query: query.as_str(),
                texts: vec![text.as_str()],
                positions: vec![pos],
            }),
        }
    }
    groups
}

/// Write `(index, score)` results for `group` into `scores`.
///
/// Every passage of the group must be scored exactly once.
pub(crate) fn scatter(
    group: &QueryGroup<'_>,
    results: impl IntoIterator<Item = (usize, f32)>,
    scores: &mut [Option<f32>],
) -> DocentResult<()> {
    let mut seen = 0usize;
    for (index, score) in results {
        let pos = *group.positions.get(index).ok_or_else(|| {
            DocentError::reranker(format!("Result index {} out of range", index))
        })?;
        scores[pos] = Some(score);
        seen += 1;
    }
    if seen != group.texts.len() {
        return Err(DocentError::reranker(format!(
            "Expected {} scores, got {}",
            group.texts.len(),
            seen
        )));
    }
    Ok(())
}

/// Unwrap scattered scores, failing if any pair was left unscored.
pub(crate) fn collect(scores: Vec<Option<f32>>) -> DocentResult<Vec<f32>> {
    scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.ok_or_else(|| DocentError::reranker(format!("Pair {} was not scored", i))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(q, t)| (q.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_groups_preserve_positions() {
        let input = pairs(&[("vpn", "a"), ("mail", "b"), ("vpn", "c")]);
        let groups = group_by_query(&input);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].query, "vpn");
        assert_eq!(groups[0].texts, vec!["a", "c"]);
        assert_eq!(groups[0].positions, vec![0, 2]);
        assert_eq!(groups[1].positions, vec![1]);
    }

    #[test]
    fn test_scatter_out_of_order_results() {
        let input = pairs(&[("vpn", "a"), ("mail", "b"), ("vpn", "c")]);
        let groups = group_by_query(&input);
        let mut scores = vec![None; input.len()];
        scatter(&groups[0], vec![(1, 0.9), (0, 0.1)], &mut scores).unwrap();
        scatter(&groups[1], vec![(0, 0.5)], &mut scores).unwrap();
        assert_eq!(collect(scores).unwrap(), vec![0.1, 0.5, 0.9]);
    }

    #[test]
    fn test_missing_scores_fail() {
        let input = pairs(&[("vpn", "a"), ("vpn", "b")]);
        let groups = group_by_query(&input);
        let mut scores = vec![None; input.len()];
        assert!(scatter(&groups[0], vec![(0, 0.3)], &mut scores).is_err());
        assert!(scatter(&groups[0], vec![(5, 0.3), (0, 0.1)], &mut scores).is_err());
        assert!(collect(vec![Some(1.0), None]).is_err());
    }
}
