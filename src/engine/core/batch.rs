use super::context::JobContext;
use super::error::Result;
use super::types::{ItemState, JobOutcome};
use tracing::debug;

/// Drive items one at a time, in order, through Pending → Running →
/// Succeeded/Failed.
///
/// `work` errors are caught here and become failed outcomes; they never stop
/// the remaining items. Items reached after cancellation are failed without
/// running. Every item gets exactly one outcome, pushed to the sink as soon as
/// it is known. `after_item(done, total, outcome)` runs once per item that
/// was started; items skipped after cancellation don't count as processed.
pub(crate) fn run_items<T, N, W, A>(
    ctx: &JobContext,
    items: &[T],
    name: N,
    mut work: W,
    mut after_item: A,
) -> Vec<JobOutcome>
where
    N: Fn(&T) -> String,
    W: FnMut(usize, &T) -> Result<JobOutcome>,
    A: FnMut(usize, usize, &JobOutcome),
{
    let total = items.len();
    let mut states = vec![ItemState::Pending; total];
    let mut outcomes = Vec::with_capacity(total);

    for (idx, item) in items.iter().enumerate() {
        let label = name(item);

        let started = !ctx.cancel.is_cancelled();
        let outcome = if !started {
            ctx.log(format!("Skipped (cancelled): {}", label));
            JobOutcome::failure(label, "cancelled")
        } else {
            states[idx] = ItemState::Running;
            debug!(item = %label, index = idx, total, "item running");
            match work(idx, item) {
                Ok(outcome) => outcome,
                Err(e) => {
                    ctx.log(format!("Failed {}: {}", label, e));
                    JobOutcome::failure(label, e.to_string())
                }
            }
        };

        states[idx] = if outcome.is_success() {
            ItemState::Succeeded
        } else {
            ItemState::Failed
        };
        ctx.outcome(outcome.clone());
        if started {
            after_item(idx + 1, total, &outcome);
        }
        outcomes.push(outcome);
    }

    debug_assert!(states.iter().all(|s| s.is_terminal()));
    outcomes
}
