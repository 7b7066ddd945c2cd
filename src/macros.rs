/// Similar to `info!` macro in tracing, but writes to a [`LogSink`](crate::logging::LogSink).
/// Pass `since <start_time>` and it will also print how long it took from starting time to now.
/// ```ignore
/// info_time!(log, "str {}, {}", 1, 2);
/// let time = Local::now();
/// info_time!(log, since time, "str {}, {}", 1, 2);
/// ```
#[macro_export]
macro_rules! info_time {
    ($sink:expr, since $time:expr, $strfm:literal $(, $arg:expr)* $(,)?) => {{
        let local_now = ::chrono::Local::now();
        let run_time = (local_now - $time)
                .num_microseconds()
                .map(|n| n as f64 / 1_000_000.0)
                .unwrap_or(0.0);
        let res = format!("{:<30} : {} | RUNTIME: {} sec", local_now, format!($strfm $(, $arg)*), run_time);
        $sink.emit(&res);
    }};
    ($sink:expr, $strfm:literal $(, $arg:expr)* $(,)?) => {{
        let local_now = ::chrono::Local::now();
        let res = format!("{:<30} : {}", local_now, format!($strfm $(, $arg)*));
        $sink.emit(&res);
    }};
}
