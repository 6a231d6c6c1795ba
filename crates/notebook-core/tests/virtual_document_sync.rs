//! End-to-end checks for the notebook -> virtual document -> cell round trip.

use notebook_core::{
    CellInsertion, Notebook, NotebookCell, NotebookRegistry, TextEdit, TextRange,
};

fn cell(uri: &str, text: &str) -> NotebookCell {
    NotebookCell::new(uri, 1, text)
}

#[test]
fn test_concrete_three_cell_scenario() {
    let mut notebook = Notebook::open_with_delimiter(
        "nb:1",
        vec![
            cell("cell:1", "a=1\n"),
            cell("cell:2", "b=2\n"),
            cell("cell:3", "c=3\n"),
        ],
        "#BOUNDARY",
    )
    .unwrap();

    assert_eq!(
        notebook.virtual_text(),
        "a=1\n#BOUNDARY\nb=2\n#BOUNDARY\nc=3\n"
    );

    let owner = notebook.line_index().cell_for_line(3).unwrap();
    assert_eq!(owner.cell_uri, "cell:2");
    assert_eq!(owner.line, 1);
}

#[test]
fn test_round_trip_after_mutations() {
    let mut notebook = Notebook::open(
        "nb:1",
        vec![
            cell("cell:1", "one\ntwo\n"),
            cell("cell:2", "three"),
            cell("cell:3", "four\nfive\n"),
        ],
    )
    .unwrap();

    // Mutate: patch a cell, then restructure.
    notebook
        .apply_content_change(
            "cell:2",
            &[TextEdit::new(TextRange::at(1, 5, 1, 5), "\nthree-b")],
        )
        .unwrap();
    notebook
        .apply_structure_change(
            vec![CellInsertion {
                position: 0,
                cell: cell("cell:0", "zero\n"),
            }],
            &["cell:3".to_string()],
        )
        .unwrap();

    // Every cell line must survive the virtual round trip.
    let index = notebook.line_index().clone();
    for expected in index.cell_uris() {
        assert!(
            (1..=index.line_count() as u32)
                .filter_map(|line| index.cell_for_line(line))
                .any(|resolved| resolved.cell_uri == expected),
            "cell {} lost from the index",
            expected
        );
    }

    // Forward: find the virtual line carrying "three-b"; reverse: it must map
    // to cell:2 line 2.
    let virtual_line = index
        .text()
        .split('\n')
        .position(|line| line == "three-b")
        .map(|i| i as u32 + 1)
        .expect("patched line present in virtual document");
    let resolved = index.cell_for_line(virtual_line).unwrap();
    assert_eq!(resolved.cell_uri, "cell:2");
    assert_eq!(resolved.line, 2);
}

#[test]
fn test_version_counts_every_mutation() {
    let mut notebook = Notebook::open("nb:1", vec![cell("cell:1", "x\n")]).unwrap();
    let start = notebook.version();

    notebook
        .apply_content_change("cell:1", &[TextEdit::new(TextRange::at(1, 0, 1, 0), "y")])
        .unwrap();
    notebook
        .apply_structure_change(
            vec![CellInsertion {
                position: 1,
                cell: cell("cell:2", "z\n"),
            }],
            &[],
        )
        .unwrap();
    notebook
        .apply_structure_change(vec![], &["cell:2".to_string()])
        .unwrap();

    assert_eq!(notebook.version(), start + 3);
    assert_eq!(notebook.line_index().for_version(), start + 3);
}

#[test]
fn test_registry_serves_virtual_documents() {
    let registry = NotebookRegistry::new();
    registry.open(Notebook::open("nb:1", vec![cell("cell:a", "a\n")]).unwrap());
    registry.open(Notebook::open("nb:2", vec![cell("cell:b", "b\n")]).unwrap());

    assert_eq!(registry.find_owning_notebook("cell:a").as_deref(), Some("nb:1"));

    {
        let mut nb = registry.get_mut("nb:2").unwrap();
        assert_eq!(nb.virtual_text(), "b\n");
    }

    assert!(registry.close("nb:1").is_some());
    assert!(!registry.is_known_cell_uri("cell:a"));
    assert!(registry.is_known_cell_uri("cell:b"));
}
