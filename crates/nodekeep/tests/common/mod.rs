//! Shared fixtures for nodekeep CLI tests.
//!
//! Every test gets its own temp repository so runs never share a registry or
//! metrics file.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub const CAT: &str = r#"import { Handle } from 'reactflow';

export default function CatNode({ id }) {
  updateNodeData(id, { status: 'ready' });
  return <Handle type="source" id="out" />;
}
"#;

pub const DOG: &str = r#"import { Handle } from 'reactflow';

export default function DogNode({ data }) {
  useEffect(() => {
    console.log(data.out);
  }, []);
  return <Handle type="target" id="in" data-upstream="CatNode" />;
}
"#;

pub const FOO_BAZ: &str = "export default function FooBazNode() {}\n";

pub const PETS: &str = r#"{
  "name": "pets",
  "nodes": [
    { "id": "1", "type": "catNode" },
    { "id": "2", "type": "dogNode" }
  ],
  "edges": [
    { "id": "e1", "source": "1", "sourceHandle": "out", "target": "2", "targetHandle": "in" }
  ]
}"#;

pub const README: &str = "# Nodes\n\nSee FooBarNode for details.\nFooBarNode is great.\n";

/// Keeps tests away from any external syntax checker.
pub const CONFIG: &str = "[syntax]\nchecker = \"\"\n";

pub struct Repo {
    dir: TempDir,
}

impl Repo {
    /// An empty repository with only the config file.
    pub fn empty() -> Self {
        let repo = Self {
            dir: TempDir::new().expect("create temp dir"),
        };
        repo.write("nodekeep.toml", CONFIG);
        repo
    }

    /// Three components, one workflow, and a README with an orphaned name.
    pub fn pets() -> Self {
        let repo = Self::empty();
        repo.write("src/nodes/input/CatNode.jsx", CAT);
        repo.write("src/nodes/process/DogNode.jsx", DOG);
        repo.write("src/nodes/util/FooBazNode.jsx", FOO_BAZ);
        repo.write("workflows/pets.json", PETS);
        repo.write("README.md", README);
        repo
    }

    /// A tree with nothing to report.
    pub fn clean() -> Self {
        let repo = Self::empty();
        repo.write("src/nodes/util/FooBazNode.jsx", FOO_BAZ);
        repo.write("README.md", "# Nodes\n\nFooBazNode does nothing.\n");
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, body: &str) {
        let path = self.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(path, body).expect("write fixture");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.join(rel)).expect("read fixture")
    }

    /// `nodekeep --root <repo>`.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_nodekeep"));
        cmd.arg("--root").arg(self.path());
        cmd
    }

    /// Run `registry build` and return the repo.
    pub fn built(self) -> Self {
        self.cmd().args(["registry", "build"]).assert().success();
        self
    }
}
