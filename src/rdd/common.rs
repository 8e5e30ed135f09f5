use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use log::{debug, trace};

use crate::util::error::{MrError, MrResult};

/// What RDDs of one engine context share: the id counter and the worker bound.
#[derive(Debug, Clone)]
pub struct RddScope {
    ids: Arc<AtomicUsize>,
    workers: usize,
}

impl RddScope {
    /// `workers` is clamped to at least one.
    pub fn new(workers: usize) -> Self {
        RddScope {
            ids: Arc::new(AtomicUsize::new(0)),
            workers: workers.max(1),
        }
    }

    pub fn next_id(&self) -> usize {
        self.ids.fetch_add(1, Ordering::SeqCst)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    index: usize,
    rows: Vec<T>,
}

impl<T> Partition<T> {
    pub fn new(index: usize, rows: Vec<T>) -> Self {
        Partition { index, rows }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Immutable, partitioned collection of rows.
///
/// Transformations run on a bounded pool of scoped workers and return a new
/// RDD with the same number of partitions.
#[derive(Debug)]
pub struct Rdd<T> {
    id: usize,
    scope: RddScope,
    partitions: Arc<Vec<Partition<T>>>,
}

impl<T> Clone for Rdd<T> {
    fn clone(&self) -> Self {
        Rdd {
            id: self.id,
            scope: self.scope.clone(),
            partitions: self.partitions.clone(),
        }
    }
}

impl<T> Rdd<T> {
    pub fn new(scope: RddScope, slices: Vec<Vec<T>>) -> Self {
        let partitions = slices
            .into_iter()
            .enumerate()
            .map(|(index, rows)| Partition::new(index, rows))
            .collect::<Vec<_>>();
        Rdd {
            id: scope.next_id(),
            scope,
            partitions: Arc::new(partitions),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Upper bound on threads used by `map` and `filter`.
    pub fn workers(&self) -> usize {
        self.scope.workers()
    }

    pub fn count(&self) -> usize {
        self.partitions.iter().map(|p| p.len()).sum()
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[Partition<T>] {
        &self.partitions
    }

    pub fn collect(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.partitions.iter().flat_map(|p| p.rows.iter().cloned()).collect()
    }

    /// Takes the rows out without cloning when this is the only handle.
    pub fn into_rows(self) -> Vec<T>
    where
        T: Clone,
    {
        match Arc::try_unwrap(self.partitions) {
            Ok(partitions) => partitions.into_iter().flat_map(|p| p.rows).collect(),
            Err(shared) => shared.iter().flat_map(|p| p.rows.iter().cloned()).collect(),
        }
    }

    pub fn map<U, F>(&self, f: F) -> MrResult<Rdd<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync,
    {
        let slices = self.run_partition_tasks("map", |p| p.rows.iter().map(&f).collect())?;
        Ok(Rdd::new(self.scope.clone(), slices))
    }

    pub fn filter<F>(&self, f: F) -> MrResult<Rdd<T>>
    where
        T: Clone + Send + Sync,
        F: Fn(&T) -> bool + Sync,
    {
        let slices = self.run_partition_tasks("filter", |p| p.rows.iter().filter(|x| f(*x)).cloned().collect())?;
        Ok(Rdd::new(self.scope.clone(), slices))
    }

    /// Runs `task` over every partition on at most `workers` scoped threads.
    /// Workers pull partitions from a shared queue until it drains.
    fn run_partition_tasks<U, F>(&self, stage: &'static str, task: F) -> MrResult<Vec<Vec<U>>>
    where
        T: Sync,
        U: Send,
        F: Fn(&Partition<T>) -> Vec<U> + Sync,
    {
        let workers = self.scope.workers.min(self.partitions.len()).max(1);
        debug!(
            "rdd {}: running `{}` over {} partitions on {} workers",
            self.id,
            stage,
            self.partitions.len(),
            workers
        );
        let (tx, rx) = crossbeam::channel::unbounded::<&Partition<T>>();
        for p in self.partitions.iter() {
            if tx.send(p).is_err() {
                return Err(MrError::TaskError(
                    "Partition queue closed",
                    format!("rdd {} stage `{}` could not queue partition {}", self.id, stage, p.index),
                ));
            }
        }
        drop(tx);

        let task = &task;
        let id = self.id;
        let joined = crossbeam::thread::scope(|s| {
            let handles = (0..workers)
                .map(|worker| {
                    let rx = rx.clone();
                    s.spawn(move |_| {
                        let mut done = vec![];
                        while let Ok(p) = rx.recv() {
                            trace!("rdd {}: `{}` on partition {} (worker {})", id, stage, p.index, worker);
                            done.push((p.index, panic::catch_unwind(AssertUnwindSafe(|| task(p))).ok()));
                        }
                        done
                    })
                })
                .collect::<Vec<_>>();
            handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
        });
        let per_worker = match joined {
            Ok(x) => x,
            Err(_) => {
                return Err(MrError::TaskError(
                    "Worker scope failed",
                    format!("rdd {} stage `{}` could not join its workers", self.id, stage),
                ));
            }
        };

        let mut slices: Vec<Option<Vec<U>>> = (0..self.partitions.len()).map(|_| None).collect();
        let mut failed = vec![];
        for (worker, res) in per_worker.into_iter().enumerate() {
            let done = match res {
                Ok(x) => x,
                Err(_) => {
                    return Err(MrError::TaskError(
                        "Worker panicked",
                        format!("rdd {} stage `{}` lost worker {}", self.id, stage, worker),
                    ));
                }
            };
            for (index, rows) in done {
                match rows {
                    Some(rows) => slices[index] = Some(rows),
                    None => failed.push(index),
                }
            }
        }
        if let Some(index) = failed.into_iter().min() {
            return Err(MrError::TaskError(
                "Partition task panicked",
                format!("rdd {} stage `{}` failed on partition {}", self.id, stage, index),
            ));
        }
        slices
            .into_iter()
            .enumerate()
            .map(|(index, rows)| {
                rows.ok_or_else(|| {
                    MrError::TaskError(
                        "Partition not processed",
                        format!("rdd {} stage `{}` never ran partition {}", self.id, stage, index),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use super::{Rdd, RddScope};

    fn sample(slices: Vec<Vec<i32>>) -> Rdd<i32> {
        Rdd::new(RddScope::new(2), slices)
    }

    #[test]
    fn valid_count_and_partitions() {
        let rdd = sample(vec![vec![0, 1], vec![], vec![2]]);
        assert_eq!(rdd.count(), 3);
        assert_eq!(rdd.num_partitions(), 3);
        assert_eq!(
            rdd.partitions().iter().map(|p| p.index()).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(rdd.partitions()[1].is_empty());
        assert_eq!(rdd.collect(), vec![0, 1, 2]);
    }

    #[test]
    fn valid_map_keeps_layout() {
        let rdd = sample(vec![vec![0, 1], vec![2, 3, 4]]);
        let mapped = rdd.map(|x| x * 10).unwrap();
        assert_eq!(mapped.num_partitions(), 2);
        assert_eq!(mapped.partitions()[0].rows(), &[0, 10]);
        assert_eq!(mapped.collect(), vec![0, 10, 20, 30, 40]);
        assert_ne!(mapped.id(), rdd.id());
    }

    #[test]
    fn valid_filter() {
        let rdd = sample(vec![vec![0, 1], vec![2, 3], vec![4]]);
        let even = rdd.filter(|x| x % 2 == 0).unwrap();
        assert_eq!(even.count(), 3);
        assert_eq!(even.num_partitions(), 3);
        assert_eq!(even.collect(), vec![0, 2, 4]);
    }

    #[test]
    fn invalid_panicking_task() {
        let rdd = sample(vec![vec![1], vec![0]]);
        let err = rdd.map(|x| 10 / x).unwrap_err();
        assert!(err.to_string().contains("partition 1"));
    }

    #[test]
    fn valid_into_rows_shared_and_unique() {
        let rdd = sample(vec![vec![5], vec![6]]);
        let other = rdd.clone();
        assert_eq!(rdd.into_rows(), vec![5, 6]);
        assert_eq!(other.into_rows(), vec![5, 6]);
    }

    #[test]
    fn valid_distinct_ids() {
        let scope = RddScope::new(1);
        let a = Rdd::new(scope.clone(), vec![vec![1]]);
        let b = Rdd::new(scope.clone(), vec![vec![2]]);
        assert_eq!(a.id() + 1, b.id());
        assert_eq!(RddScope::new(0).workers(), 1);
    }

    #[test]
    fn valid_workers_bounded_by_scope() {
        for workers in [1, 3] {
            let rdd = Rdd::new(RddScope::new(workers), (0..32).map(|x| vec![x]).collect());
            let running = AtomicUsize::new(0);
            let peak = AtomicUsize::new(0);
            let threads = Mutex::new(HashSet::new());
            let mapped = rdd
                .map(|x| {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    threads.lock().unwrap().insert(thread::current().id());
                    thread::sleep(Duration::from_millis(2));
                    running.fetch_sub(1, Ordering::SeqCst);
                    *x
                })
                .unwrap();
            assert_eq!(mapped.collect(), (0..32).collect::<Vec<_>>());
            assert_eq!(mapped.workers(), workers);
            assert!(peak.load(Ordering::SeqCst) <= workers);
            assert!(threads.lock().unwrap().len() <= workers);
        }
    }

    #[test]
    fn valid_filter_on_single_worker() {
        let rdd = Rdd::new(RddScope::new(1), (0..10).map(|x| vec![x, x + 10]).collect());
        let big = rdd.filter(|x| *x >= 10).unwrap();
        assert_eq!(big.num_partitions(), 10);
        assert_eq!(big.collect(), (10..20).collect::<Vec<_>>());
    }
}
