use crate::helpers::temp_files::TempFileManager;

#[test]
fn tfm_creates_files_and_cleans_up() {
    let base;
    {
        let tfm = TempFileManager::new().expect("temp dir");
        base = tfm.base_dir().to_path_buf();
        let dir = tfm.create_directory("logs").expect("dir");
        assert!(dir.is_dir());
        let file = tfm.create_file("logs/draws.jsonl", "{}\n").expect("file");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "{}\n");
    }
    assert!(!base.exists(), "temp dir should be removed on drop");
}
