#[test]
fn try_cmd() {
    trycmd::TestCases::new().case("tests/cmd/*.toml").run();
}
