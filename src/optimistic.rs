use std::{fmt::Display, future::Future};

/// What an operator action ended up doing to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Local state changed and the backend accepted it
    Applied,
    /// The operator declined the confirmation; nothing changed
    Declined,
    /// Refused client-side before any request was sent
    Rejected,
    /// The backend call failed and the local change was reverted
    RolledBack,
    /// The backend call failed and the list was reloaded from the server
    Reloaded,
    /// A non-optimistic call failed; local state was never touched
    Failed,
}

impl ActionOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }
}

/// Snapshot, apply, then confirm or revert.
///
/// `read` captures the current value before anything changes, `write`
/// installs `next` immediately, and `commit` is the server mutation. On
/// failure the captured value is written back and the error returned so the
/// caller can notify the operator.
pub async fn optimistic_update<S, T, R, W, Fut, E>(
    state: &mut S,
    read: R,
    write: W,
    next: T,
    commit: Fut,
) -> Result<(), E>
where
    R: FnOnce(&S) -> T,
    W: Fn(&mut S, T),
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let previous = read(state);
    write(state, next);

    match commit.await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::warn!("optimistic update rejected by backend, reverting: {}", e);
            write(state, previous);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        enabled: bool,
    }

    #[tokio::test]
    async fn success_keeps_the_new_value() {
        let mut rows = vec![Row { id: 1, enabled: false }];
        let result: Result<(), String> = optimistic_update(
            &mut rows,
            |rows| rows[0].enabled,
            |rows, v| rows[0].enabled = v,
            true,
            async { Ok(()) },
        )
        .await;
        assert!(result.is_ok());
        assert!(rows[0].enabled);
    }

    #[tokio::test]
    async fn failure_restores_the_snapshot() {
        let mut rows = vec![Row { id: 1, enabled: false }, Row { id: 2, enabled: true }];
        let result = optimistic_update(
            &mut rows,
            |rows| rows[1].enabled,
            |rows, v| rows[1].enabled = v,
            false,
            async { Err::<(), _>("boom".to_string()) },
        )
        .await;
        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(rows[1], Row { id: 2, enabled: true });
        assert!(!rows[0].enabled);
    }
}
