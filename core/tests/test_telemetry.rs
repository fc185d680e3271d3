#[cfg(test)]
mod telemetry_tests {
    use std::time::Duration;

    use crossbeam::channel::bounded;

    use packguard_core::telemetry::{
        NoProgress, PackCounters, ProgressSink, ProgressUpdate, Stage, StageTimes, TelemetryTimer,
    };

    #[test]
    fn counters_accumulate() {
        let mut a = PackCounters::default();
        a.add_encrypted(10);
        a.add_verbatim(5);
        a.add_directory();

        let mut b = PackCounters::default();
        b.add_decrypted(7);
        b.add_subpack();

        a += b;
        assert_eq!(a.total_entries(), 3);
        assert_eq!(a.bytes_in, 22);
        assert_eq!(a.directories, 1);
        assert_eq!(a.subpacks, 1);
    }

    #[test]
    fn stage_times_sum_per_stage() {
        let mut times = StageTimes::default();
        times.add(Stage::Encrypt, Duration::from_millis(5));
        times.add(Stage::Encrypt, Duration::from_millis(7));
        times.add(Stage::Write, Duration::from_millis(3));

        assert_eq!(times.get(Stage::Encrypt), Duration::from_millis(12));
        assert_eq!(times.get(Stage::Decrypt), Duration::ZERO);
        assert_eq!(times.total(), Duration::from_millis(15));
        assert!((times.get_ms(Stage::Write) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn timer_marks_stages_in_sequence() {
        let mut timer = TelemetryTimer::new();
        std::thread::sleep(Duration::from_millis(5));
        timer.mark(Stage::Read);
        timer.mark(Stage::Write);

        assert!(timer.stage_times.get(Stage::Read) >= Duration::from_millis(5));
        assert!(timer.elapsed() >= timer.stage_times.total());
    }

    #[test]
    fn progress_percent_is_clamped() {
        assert_eq!(ProgressUpdate::new(Stage::Write, 250).percent, 100);
        assert_eq!(ProgressUpdate::new(Stage::Read, 10).stage, "read");
    }

    #[test]
    fn channel_sink_never_blocks() {
        let (tx, rx) = bounded::<ProgressUpdate>(1);
        tx.report(ProgressUpdate::new(Stage::Read, 1));
        // Full: dropped, not blocking.
        tx.report(ProgressUpdate::new(Stage::Read, 2));
        assert_eq!(rx.try_iter().count(), 1);

        drop(rx);
        tx.report(ProgressUpdate::new(Stage::Read, 3));
        NoProgress.report(ProgressUpdate::new(Stage::Read, 4));
    }
}
