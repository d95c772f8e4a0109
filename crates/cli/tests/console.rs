use filestore_cli::console::{self, Console};
use filestore_core::{FileStorage, StorageService};
use std::fs;
use std::io::Cursor;

async fn run_script(storage: FileStorage, script: String) -> String {
    let handle = StorageService::spawn(storage);
    let mut console = Console::new(handle, Cursor::new(script.into_bytes()), Vec::new());
    console.run().await.unwrap();
    String::from_utf8(console.into_output()).unwrap()
}

#[tokio::test]
async fn scripted_session_stores_tags_loads_and_deletes() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("example_file.txt");
    fs::write(&src, "This is an example file.").unwrap();
    let root = temp.path().join("storage");
    let storage = FileStorage::open(&root, "file_index.json").unwrap();

    let script = [
        "1",
        src.to_str().unwrap(),
        "demo_file.txt",
        "demo, text,",
        "5",
        "demo_file.txt",
        "important",
        "4",
        "demo_file.txt",
        "2",
        "",
        "demo",
        ".txt",
        "6",
        "7",
        "demo_file.txt",
        "3",
        "8",
    ]
    .join("\n")
        + "\n";

    let out = run_script(storage, script).await;
    assert!(out.contains("File stored successfully at:"));
    assert!(out.contains("Tags updated for demo_file.txt: [demo, important, text]"));
    assert!(out.contains("Content of demo_file.txt:\nThis is an example file."));
    assert!(out.contains("Found 1 file(s):"));
    assert!(out.contains("All tags in storage (3 total):"));
    assert!(out.contains("File demo_file.txt deleted successfully!"));
    assert!(out.contains("All 0 file(s) in storage:"));
    assert!(out.trim_end().ends_with("Goodbye!"));
    assert!(!root.join("demo_file.txt").exists());
}

#[tokio::test]
async fn errors_are_reported_and_the_loop_continues() {
    let temp = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(temp.path().join("storage"), "file_index.json").unwrap();
    let missing = temp.path().join("nope.txt");

    let script = format!(
        "1\n{}\n\n\n9\n5\nghost.txt\na\n4\nghost.txt\n",
        missing.display()
    );
    let out = run_script(storage, script).await;
    assert!(out.contains("Error: Source file not found!"));
    assert!(out.contains("Invalid choice. Please try again."));
    assert!(out.contains("File ghost.txt not found!"));
    assert!(out.contains("Error loading file: file not found in storage: ghost.txt"));
    // Input ran out without an explicit exit.
    assert!(out.trim_end().ends_with("Goodbye!"));
}

#[tokio::test]
async fn long_content_is_truncated_in_preview() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("long.txt");
    fs::write(&src, "x".repeat(600)).unwrap();
    let mut storage = FileStorage::open(temp.path().join("storage"), "file_index.json").unwrap();
    storage.store(&src, None, &[]).unwrap();

    let out = run_script(storage, "4\nlong.txt\n8\n".to_string()).await;
    assert!(out.contains(&format!("{}\n... (content truncated)", "x".repeat(500))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_session_hands_back_its_output() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("a.txt");
    fs::write(&src, "alpha").unwrap();
    let mut storage = FileStorage::open(temp.path().join("storage"), "file_index.json").unwrap();
    storage.store(&src, None, &[]).unwrap();
    let handle = StorageService::spawn(storage);

    let input = Cursor::new(b"4\na.txt\n8\n".to_vec());
    let out = console::run_blocking(handle, input, Vec::new()).await.unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Content of a.txt:\nalpha"));
    assert!(out.trim_end().ends_with("Goodbye!"));
}
