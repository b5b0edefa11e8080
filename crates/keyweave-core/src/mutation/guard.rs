use super::RowMutation;
use crate::{
    index::{Applied, RowIndex},
    obs::sink::{MetricsEvent, record},
    row::Row,
};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

///
/// MutationGuard
///
/// Compensation list for one in-flight row mutation.
///
/// Every index that changed is recorded with the compensation for what it
/// reported doing. Unless `finish` is called, the compensations run in
/// reverse order, either through `rollback` or on drop while unwinding.
/// Indices that accepted the mutation without changing are never touched.
///

pub(crate) struct MutationGuard<'i, 'r, R: Row> {
    mutation: RowMutation<'r, R>,
    applied: Vec<(&'i dyn RowIndex<R>, RowMutation<'r, R>)>,
    pending: Option<&'i dyn RowIndex<R>>,
    finished: bool,
}

impl<'i, 'r, R: Row> MutationGuard<'i, 'r, R> {
    pub(crate) fn new(mutation: RowMutation<'r, R>) -> Self {
        Self {
            mutation,
            applied: Vec::new(),
            pending: None,
            finished: false,
        }
    }

    /// Mark `index` as the one currently being mutated.
    pub(crate) const fn enter(&mut self, index: &'i dyn RowIndex<R>) {
        self.pending = Some(index);
    }

    /// The pending index accepted the mutation and reported `applied`.
    pub(crate) fn accepted(&mut self, applied: Applied) {
        let Some(index) = self.pending.take() else {
            return;
        };
        if let Some(undo) = self.mutation.compensation(applied) {
            self.applied.push((index, undo));
        }
    }

    pub(crate) fn finish(mut self) {
        self.finished = true;
        self.applied.clear();
    }

    /// Compensate after the pending index rejected the mutation.
    pub(crate) fn rollback(mut self) {
        self.rollback_best_effort();
    }

    fn rollback_best_effort(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let failed_index = self.pending.take().map_or("", |index| index.index_name());
        let steps = self.applied.len() as u64;
        let mut failures = 0u64;
        debug!(
            failed_index,
            steps,
            kind = self.mutation.kind(),
            "rolling back row mutation"
        );

        // Reverse order mirrors application; never unwind past this boundary.
        while let Some((index, undo)) = self.applied.pop() {
            match catch_unwind(AssertUnwindSafe(|| undo.apply_to(index))) {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    warn!(
                        index = index.index_name(),
                        failed_index,
                        error = %err,
                        "rollback step failed"
                    );
                }
                Err(_) => {
                    failures += 1;
                    warn!(
                        index = index.index_name(),
                        failed_index,
                        "rollback step panicked"
                    );
                }
            }
        }

        record(MetricsEvent::MutationRollback {
            failed_index,
            steps,
            failures,
        });
    }
}

impl<R: Row> Drop for MutationGuard<'_, '_, R> {
    fn drop(&mut self) {
        if !self.finished {
            self.rollback_best_effort();
        }
    }
}
