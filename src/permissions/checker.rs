//! Static admin allow-list.

use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct AdminList {
    ids: Arc<HashSet<u64>>,
}

impl AdminList {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: Arc::new(ids.into_iter().collect()),
        }
    }

    #[inline]
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.ids.contains(&user_id)
    }

    /// Admin ids in ascending order.
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let admins = AdminList::new([3, 1]);

        assert!(admins.is_admin(1));
        assert!(!admins.is_admin(2));
        assert_eq!(admins.ids(), vec![1, 3]);
        assert!(AdminList::default().is_empty());
    }
}
