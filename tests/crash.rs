#[test]
fn exits_with_code() {
    capbox::crash_test(
        || {
            print!("Ping");
            eprint!("Pong");
            std::process::exit(33);
        },
        |output| {
            output
                .assert_code(33)
                .assert_stdout_eq("Ping")
                .assert_stderr_eq("Pong");
            assert_eq!(output.signal(), None);
        },
    )
    .unwrap();
}

#[test]
#[cfg(unix)]
fn exit_code_is_truncated() {
    capbox::crash_test(
        || std::process::exit(289),
        |output| {
            output.assert_code(33);
        },
    )
    .unwrap();
}

#[test]
fn returning_action_fails_the_child() {
    capbox::crash_test(
        || {
            print!("forgot to exit");
        },
        |output| {
            output.assert_code(101);
            assert!(output.stdout.starts_with("forgot to exit"));
            assert!(
                output.stderr.contains("the action must exit the process"),
                "{}",
                output.stderr
            );
        },
    )
    .unwrap();
}

#[test]
fn panicking_action_fails_the_child() {
    capbox::crash_test(
        || panic!("boom"),
        |output| {
            output.assert_code(101);
            assert!(output.stderr.contains("boom"), "{}", output.stderr);
        },
    )
    .unwrap();
}

#[test]
#[cfg(unix)]
fn timeout_kills_the_child() {
    capbox::CrashTest::new()
        .timeout(std::time::Duration::from_millis(200))
        .run(
            || {
                std::thread::sleep(std::time::Duration::from_secs(30));
                std::process::exit(0);
            },
            |output| {
                output.assert_interrupted();
                assert_eq!(output.signal(), Some(9));
                assert_eq!(output.code(), -9);
                assert_eq!(
                    capbox::display_exit_status(output.status),
                    "interrupted (signal: 9, SIGKILL: kill)"
                );
            },
        )
        .unwrap();
}

#[test]
#[cfg(unix)]
fn abort_is_interrupted() {
    capbox::crash_test(|| std::process::abort(), |output| {
        output.assert_interrupted();
        assert!(output.code() < 0);
    })
    .unwrap();
}

#[test]
fn several_cases_in_one_test() {
    capbox::Assert::new()
        .crash(
            "code 33",
            || {
                print!("Ping");
                eprint!("Pong");
                std::process::exit(33);
            },
            |a, output| {
                a.eq(33, output.code())
                    .eq("Ping", output.stdout.as_str())
                    .eq("Pong", output.stderr.as_str());
            },
        )
        .crash(
            "code 0",
            || std::process::exit(0),
            |a, output| {
                a.eq(0, output.code()).eq("", output.stdout.as_str());
            },
        )
        .it("nested", |a| {
            a.crash(
                "code 7",
                || std::process::exit(7),
                |a, output| {
                    a.eq(7, output.code());
                },
            );
        })
        .finish();
}

#[test]
fn explicit_test_name_and_case() {
    capbox::CrashTest::new()
        .test_name("explicit_test_name_and_case")
        .case("explicit")
        .run(
            || std::process::exit(12),
            |output| {
                output.assert_code(12);
            },
        )
        .unwrap();
}

#[test]
fn unknown_test_name_is_an_error() {
    let err = std::thread::spawn(|| capbox::crash_test(|| std::process::exit(1), |_| {}))
        .join()
        .unwrap()
        .unwrap_err();
    assert!(
        err.message().starts_with("Unable to detect the running test's name"),
        "{err}"
    );
}
