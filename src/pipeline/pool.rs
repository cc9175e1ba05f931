// src/pipeline/pool.rs
// Scoped worker pool: N threads pull indices from a shared counter and send
// results back over a channel. Output order always follows input order.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use crate::progress::Progress;

/// Apply `f` to every item on up to `workers` threads.
pub fn map_indexed<T, R, F>(items: &[T], workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync,
{
    map_with_progress(items, workers, f, None)
}

pub fn map_with_progress<T, R, F>(
    items: &[T],
    workers: usize,
    f: F,
    mut progress: Option<&mut dyn Progress>,
) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync,
{
    if let Some(p) = progress.as_deref_mut() {
        p.begin(items.len());
    }

    let counter = AtomicUsize::new(0);
    let workers = workers.min(items.len()).max(1);
    let mut out: Vec<(usize, R)> = Vec::with_capacity(items.len());

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<(usize, R)>();
        for _ in 0..workers {
            let tx = tx.clone();
            let (counter, f) = (&counter, &f);
            scope.spawn(move || {
                loop {
                    let i = counter.fetch_add(1, Ordering::Relaxed);
                    if i >= items.len() {
                        break;
                    }
                    if tx.send((i, f(i, &items[i]))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx); // collector is the sole receiver now

        for (i, r) in rx {
            if let Some(p) = progress.as_deref_mut() {
                p.item_done(i);
            }
            out.push((i, r));
        }
    });

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }

    out.sort_by_key(|(i, _)| *i);
    out.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_input_order() {
        let items: Vec<u64> = (0..100).collect();
        let out = map_indexed(&items, 4, |_, x| x * 2);
        assert_eq!(out, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input() {
        let out: Vec<u8> = map_indexed(&[] as &[u8], 4, |_, x| *x);
        assert!(out.is_empty());
    }
}
