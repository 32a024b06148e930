use crate::SplitAssignment;

/// Divides splits `1..=num_file_splits` into contiguous ranges, one per host
/// in host order. Every host but the last gets `num_file_splits / host_count`
/// splits (at least one); the last host takes whatever remains. Assignment
/// stops as soon as the final split is handed out, so with more hosts than
/// splits the trailing hosts get nothing.
pub fn partition(num_file_splits: u32, host_count: usize) -> Vec<SplitAssignment> {
    let mut assignments = Vec::new();
    if num_file_splits == 0 || host_count == 0 {
        return assignments;
    }

    let per_host = (num_file_splits as usize / host_count).max(1) as u32;
    let mut first_split = 1;

    for host in 0..host_count {
        let last_split = if host == host_count - 1 {
            num_file_splits
        } else {
            first_split + per_host - 1
        };
        assignments.push(SplitAssignment {
            first_split,
            last_split,
        });
        if last_split == num_file_splits {
            break;
        }
        first_split = last_split + 1;
    }

    assignments
}
