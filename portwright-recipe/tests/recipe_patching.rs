//! Recipe patching properties across a range of hand-written recipes.

use portwright_recipe::{patch, read_fetch_arguments, FetchSpec, RecipeContext, RecipeEngine};
use rstest::rstest;

fn spec() -> FetchSpec {
    FetchSpec {
        repo: "owner/zlib-ng".to_string(),
        git_ref: "0123456789abcdef".to_string(),
        sha512: "a1b2c3".to_string(),
        head_ref: "develop".to_string(),
    }
}

fn generated() -> String {
    RecipeEngine::new()
        .expect("engine")
        .render(&RecipeContext::new(
            "zlib-ng",
            &FetchSpec {
                repo: "owner/zlib-ng".to_string(),
                git_ref: "old".to_string(),
                sha512: "0".to_string(),
                head_ref: "main".to_string(),
            },
        ))
        .expect("render")
}

const CUSTOMISED: &str = r#"# Maintainer note: do not drop the patch below.
vcpkg_from_github(
    OUT_SOURCE_PATH SOURCE_PATH
    REPO owner/zlib-ng
    REF old   # pinned by CI
    SHA512 0
    HEAD_REF main
    PATCHES
        0001-fix-install-dirs.patch
)

vcpkg_cmake_configure(
    SOURCE_PATH "${SOURCE_PATH}"
    OPTIONS
        -DZLIB_COMPAT=ON
        -DWITH_GTEST=OFF
)
vcpkg_cmake_install()
vcpkg_copy_pdbs()
"#;

const TABBED: &str = "VCPKG_FROM_GITHUB(\n\tOUT_SOURCE_PATH SOURCE_PATH\n\tREPO owner/zlib-ng\n\tREF \"old\"\n\tSHA512 \"0\"\n\tHEAD_REF main\n\t)\n";

const BRACKETS: &str = "#[=[\nvcpkg_from_github(REF decoy)\n]=]\nset(X [[ ) ]])\nvcpkg_from_github(OUT_SOURCE_PATH SOURCE_PATH REPO owner/zlib-ng REF old SHA512 0)\n";

#[rstest]
#[case::generated(generated())]
#[case::customised(CUSTOMISED.to_string())]
#[case::tabbed(TABBED.to_string())]
#[case::brackets(BRACKETS.to_string())]
fn patching_twice_equals_patching_once(#[case] recipe: String) {
    let once = patch(&recipe, &spec()).expect("first patch");
    let twice = patch(&once, &spec()).expect("second patch");
    assert_eq!(once, twice);

    let args = read_fetch_arguments(&once).expect("read back");
    assert_eq!(args["REF"], "0123456789abcdef");
    assert_eq!(args["SHA512"], "a1b2c3");
    assert_eq!(args["HEAD_REF"], "develop");
    assert_eq!(args["REPO"], "owner/zlib-ng");
}

#[test]
fn custom_comments_and_steps_survive() {
    let out = patch(CUSTOMISED, &spec()).expect("patch");
    let expected = CUSTOMISED
        .replace("REF old   # pinned by CI", "REF 0123456789abcdef   # pinned by CI")
        .replace("SHA512 0\n", "SHA512 a1b2c3\n")
        .replace("HEAD_REF main", "HEAD_REF develop");
    assert_eq!(out, expected);
    assert!(out.contains("# Maintainer note: do not drop the patch below."));
    assert!(out.contains("        0001-fix-install-dirs.patch\n"));
    assert!(out.contains("vcpkg_copy_pdbs()"));
}

#[test]
fn decoys_in_bracket_comments_and_arguments_are_ignored() {
    let out = patch(BRACKETS, &spec()).expect("patch");
    assert!(out.starts_with("#[=[\nvcpkg_from_github(REF decoy)\n]=]\nset(X [[ ) ]])\n"));
    assert!(out.ends_with("REF 0123456789abcdef SHA512 a1b2c3 HEAD_REF develop)\n"));
}

#[test]
fn uppercase_command_name_and_quotes_are_preserved() {
    let out = patch(TABBED, &spec()).expect("patch");
    assert!(out.starts_with("VCPKG_FROM_GITHUB(\n"));
    assert!(out.contains("\tREF \"0123456789abcdef\"\n"));
    assert!(out.contains("\tSHA512 \"a1b2c3\"\n"));
    assert!(out.ends_with("\t)\n"));
}
