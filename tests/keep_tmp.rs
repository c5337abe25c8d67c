// Mutates the process environment, keep it the only test in this binary.
#[test]
fn env_keeps_tmp_dirs() {
    std::env::set_var(capbox::TMP_DISABLE_ENV, "true");
    let config = capbox::Config::from_env();
    assert!(config.is_keep_tmp());

    let mut seen = None;
    capbox::Assert::with_config(config)
        .it_tmp("kept", |a, dir| {
            std::fs::write(dir.join("out.txt"), "data").unwrap();
            a.is_file(dir.join("out.txt"));
            seen = Some(dir.to_owned());
        })
        .finish();

    let seen = seen.unwrap();
    assert!(seen.join("out.txt").is_file(), "{} was removed", seen.display());
    std::fs::remove_dir_all(&seen).unwrap();

    std::env::set_var(capbox::TMP_DISABLE_ENV, "0");
    let dir = capbox::fs::tmp_dir(false, |dir| dir.to_owned()).unwrap();
    assert!(!dir.exists());

    std::env::set_var(capbox::STACK_ENV, "1");
    std::env::set_var(capbox::FATAL_ENV, "t");
    std::env::set_var(capbox::OS_ENV, "plan9");
    let config = capbox::Config::from_env();
    assert!(config.is_stack());
    assert!(config.is_fatal());
    assert!(!config.is_active());
    assert!(!config.is_keep_tmp());
}
