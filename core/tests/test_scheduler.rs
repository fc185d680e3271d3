mod common;

#[cfg(test)]
mod scheduler_tests {
    use std::time::Duration;

    use bytes::Bytes;

    use packguard_core::config::PoolConfig;
    use packguard_core::crypto::{decrypt, generate_key, KeyError};
    use packguard_core::scheduler::{
        max_units_for, run_batch, run_sequential, ParallelismProfile, PoolMode, SchedulerError, Task,
        TaskError, WorkerPool,
    };

    fn pool(max_units: usize) -> WorkerPool {
        WorkerPool::new(&PoolConfig { max_units: Some(max_units), ..PoolConfig::default() }).unwrap()
    }

    fn tasks(n: usize) -> (Vec<Task>, Vec<Vec<u8>>) {
        let key = generate_key();
        let payloads: Vec<Vec<u8>> = (0..n).map(|i| format!("payload #{i}").repeat(i + 1).into_bytes()).collect();
        let tasks = payloads
            .iter()
            .enumerate()
            .map(|(i, p)| Task::encrypt(format!("t{i}"), Bytes::from(p.clone()), key))
            .collect();
        (tasks, payloads)
    }

    #[test]
    fn constrained_sizing_leaves_a_core_and_caps_at_four() {
        assert_eq!(max_units_for(PoolMode::Constrained, 1), 1);
        assert_eq!(max_units_for(PoolMode::Constrained, 2), 1);
        assert_eq!(max_units_for(PoolMode::Constrained, 4), 3);
        assert_eq!(max_units_for(PoolMode::Constrained, 5), 4);
        assert_eq!(max_units_for(PoolMode::Constrained, 64), 4);
    }

    #[test]
    fn unconstrained_sizing_is_fixed() {
        assert_eq!(max_units_for(PoolMode::Unconstrained, 1), 8);
        assert_eq!(max_units_for(PoolMode::Unconstrained, 64), 8);
    }

    #[test]
    fn profiles_never_allow_zero_units() {
        assert_eq!(ParallelismProfile::fixed(0).max_units, 1);
        assert_eq!(ParallelismProfile::single_threaded().max_units, 1);
        assert!(ParallelismProfile::dynamic(PoolMode::Constrained).max_units >= 1);
    }

    #[test]
    fn pool_mode_parses_aliases() {
        assert_eq!("production".parse::<PoolMode>().unwrap(), PoolMode::Constrained);
        assert_eq!("Development".parse::<PoolMode>().unwrap(), PoolMode::Unconstrained);
        assert!("turbo".parse::<PoolMode>().is_err());
    }

    #[test]
    fn batch_results_are_index_aligned() {
        let pool = pool(3);
        let (batch, payloads) = tasks(25);
        let keys: Vec<_> = batch.iter().map(|t| t.key).collect();

        let results = pool.submit_batch(batch).unwrap();
        assert_eq!(results.len(), payloads.len());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.label, format!("t{i}"));
            let sealed = result.outcome.as_ref().unwrap();
            assert_eq!(decrypt(sealed, &keys[i]).unwrap(), payloads[i]);
        }

        let stats = pool.stats().unwrap();
        assert_eq!(stats.max_units, 3);
        assert!(stats.peak_busy <= 3);
        assert!(stats.spawned <= 3);
        assert_eq!(stats.completed, 25);
    }

    #[test]
    fn pool_and_sequential_agree() {
        let pool = pool(2);
        let (batch, _) = tasks(10);

        let parallel = run_batch(Some(&pool), batch.clone()).unwrap();
        let sequential = run_sequential(&batch).unwrap();
        assert!(!parallel.sequential);
        assert_eq!(parallel.payloads, sequential);
    }

    #[test]
    fn shut_down_pool_triggers_fallback() {
        crate::common::init_tracing();
        let pool = pool(2);
        pool.shutdown();

        let (batch, _) = tasks(4);
        assert!(matches!(pool.submit_batch(batch.clone()), Err(SchedulerError::Unavailable(_))));

        let outcome = run_batch(Some(&pool), batch).unwrap();
        assert!(outcome.sequential);
        assert_eq!(outcome.payloads.len(), 4);
    }

    #[test]
    fn fallback_policy_follows_error_kind() {
        let timeout = SchedulerError::Rejected {
            label: "x".into(),
            source: TaskError::Timeout { limit: Duration::from_secs(30) },
        };
        let fault = SchedulerError::Rejected { label: "x".into(), source: TaskError::WorkerFault("gone".into()) };
        let cipher = SchedulerError::Rejected {
            label: "x".into(),
            source: TaskError::Cipher(KeyError::Cipher("bad".into())),
        };

        assert!(timeout.allows_fallback());
        assert!(fault.allows_fallback());
        assert!(SchedulerError::Disconnected.allows_fallback());
        assert!(!cipher.allows_fallback());
    }

    #[test]
    fn single_submit_round_trips() {
        let pool = pool(1);
        let key = generate_key();
        let sealed = pool
            .submit(Task::encrypt("one", Bytes::from_static(b"hello"), key))
            .unwrap();
        let opened = pool
            .submit(Task::decrypt("one", sealed.outcome.unwrap(), key))
            .unwrap();
        assert_eq!(opened.outcome.unwrap(), Bytes::from_static(b"hello"));
    }
}
