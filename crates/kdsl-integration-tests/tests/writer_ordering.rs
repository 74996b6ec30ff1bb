//! Ordering and shutdown behaviour of the background writer as seen by
//! several producers writing files.

use std::sync::{Arc, Mutex};

use kdsl_concurrent::{AsyncWriter, WriterError, WriterOptions};

#[test]
fn test_last_write_to_a_path_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Accessors.kt");
    let writer = AsyncWriter::start().unwrap();

    let handles: Vec<_> = (0..20)
        .map(|i| writer.write_file(&path, format!("revision {i}")).unwrap())
        .collect();
    writer.close().unwrap();

    for handle in handles {
        handle.wait().unwrap();
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "revision 19");
}

#[test]
fn test_close_drains_every_producer() {
    let dir = tempfile::tempdir().unwrap();
    let writer = AsyncWriter::with_options(WriterOptions::new().with_queue_capacity(2)).unwrap();
    let written = Arc::new(Mutex::new(Vec::new()));

    let producers: Vec<_> = (0..3)
        .map(|producer| {
            let handle = writer.handle();
            let root = dir.path().to_path_buf();
            let written = Arc::clone(&written);
            std::thread::spawn(move || {
                for i in 0..10 {
                    let path = root.join(format!("p{producer}-{i}.class"));
                    let _ = handle.write_file(&path, vec![0xCA, 0xFE]).unwrap();
                    written.lock().unwrap().push(path);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    writer.close().unwrap();

    let written = written.lock().unwrap();
    assert_eq!(written.len(), 30);
    for path in written.iter() {
        assert_eq!(std::fs::read(path).unwrap(), [0xCA, 0xFE]);
    }
}

#[test]
fn test_handles_fail_after_close() {
    let writer = AsyncWriter::start().unwrap();
    let handle = writer.handle();
    writer.close().unwrap();

    assert!(matches!(
        handle.submit(|| Ok::<_, std::io::Error>(())),
        Err(WriterError::Closed)
    ));
    assert!(matches!(
        handle.write_file("unused", Vec::new()),
        Err(WriterError::Closed)
    ));
}

#[test]
fn test_panicking_command_is_isolated() {
    let writer = AsyncWriter::start().unwrap();
    let failed = writer
        .submit(|| -> Result<(), std::io::Error> { panic!("generator bug") })
        .unwrap();
    let next = writer.submit(|| Ok::<_, std::io::Error>("still running")).unwrap();
    writer.close().unwrap();

    assert!(matches!(failed.wait(), Err(WriterError::ActionPanicked(_))));
    assert_eq!(next.wait().unwrap(), "still running");
}
