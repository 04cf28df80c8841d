use clap::Parser;
use nettopo::cli::{Cli, CliRunner};

#[tokio::test]
async fn test_render_command_writes_svg_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lab.json");
    let output = dir.path().join("lab.svg");
    std::fs::write(
        &input,
        r#"{
            "name": "Lab",
            "nodes": [
                { "id": "r1", "type": "router" },
                { "id": "sw1", "type": "switch" }
            ],
            "links": [
                { "from": "r1:ge-0/0/0", "to": "sw1", "bandwidth": "10G" }
            ]
        }"#,
    )
    .unwrap();

    let cli = Cli::parse_from([
        "nettopo",
        "render",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);
    CliRunner::new(&cli).run(cli.command).await.unwrap();

    let svg = std::fs::read_to_string(&output).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"data-id="r1""#));
    assert!(svg.contains(r#"data-port="r1:ge-0/0/0""#));
}

#[tokio::test]
async fn test_render_command_emits_artifact_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dc.json");
    let output = dir.path().join("dc.json.out");
    std::fs::write(
        &input,
        r#"{
            "name": "DC",
            "subgraphs": [ { "id": "dc1", "label": "DC 1" } ],
            "nodes": [
                { "id": "leaf1", "parent": "dc1" },
                { "id": "core" }
            ],
            "links": [ { "from": "leaf1", "to": "core" } ]
        }"#,
    )
    .unwrap();

    let cli = Cli::parse_from([
        "nettopo",
        "render",
        input.to_str().unwrap(),
        "--sheets",
        "-o",
        output.to_str().unwrap(),
    ]);
    CliRunner::new(&cli).run(cli.command).await.unwrap();

    let artifact: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(artifact["hierarchical"], serde_json::Value::Bool(true));
    assert_eq!(artifact["rootSheetId"], "root");
    assert!(artifact["sheets"]["dc1"]["svg"]
        .as_str()
        .unwrap()
        .starts_with("<svg"));
    assert_eq!(artifact["sheets"]["dc1"]["parentId"], "root");
    assert_eq!(artifact["nodeCount"], 2);
}
