#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = native::run() {
        eprintln!("multitransform_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use multitransform::document::{Document, ObjectKind, RecomputeResult};
    use multitransform::geom::GeomMesh;
    use multitransform::parse::document_xml;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const USAGE: &str = r#"multitransform_cli (multitransform)

USAGE:
  multitransform_cli list <document.xml>
  multitransform_cli run <document.xml> <feature|all> [options]

OPTIONS (run):
  --obj <path>       Write the patterned shape as OBJ (single feature only)
  --overwrite        Overwrite existing output files
  -h, --help         Show this help

Set RUST_LOG=debug for recompute diagnostics.
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => cmd_list(&mut args),
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn load(path: &str) -> Result<Document, String> {
        let xml = fs::read_to_string(path).map_err(|e| format!("read {path}: {e}"))?;
        document_xml::parse_str(&xml).map_err(|e| format!("parse {path}: {e}"))
    }

    fn cmd_list(args: &mut Args) -> Result<(), String> {
        let path = args.next().ok_or("missing document path")?;
        let document = load(&path)?;

        for object in document.objects() {
            match &object.kind {
                ObjectKind::MultiTransform(feature) => println!(
                    "{}  [{}] originals: {}",
                    object.name,
                    feature.transformations.join(", "),
                    feature.originals.join(", ")
                ),
                other => println!("{}  ({})", object.name, other.type_name()),
            }
        }
        Ok(())
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let path = args.next().ok_or("missing document path")?;
        let feature = args.next().ok_or("missing feature name")?;

        let mut obj_path: Option<PathBuf> = None;
        let mut overwrite = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        let mut document = load(&path)?;

        if feature == "all" {
            if obj_path.is_some() {
                return Err("--obj needs a single feature, not `all`".to_string());
            }
            let results = document.recompute_all().map_err(|e| e.to_string())?;
            for (name, result) in &results {
                print_result(name, result);
            }
            return Ok(());
        }

        let result = document
            .recompute(&feature)
            .map_err(|e| format!("{feature}: {e}"))?;
        print_result(&feature, &result);

        if let Some(obj_path) = obj_path {
            write_obj_file(&obj_path, &result.shape, &feature, overwrite)?;
            println!("wrote {}", obj_path.display());
        }
        Ok(())
    }

    fn print_result(name: &str, result: &RecomputeResult) {
        println!(
            "{name}: {} placements, {} triangles",
            result.placements.len(),
            result.shape.triangle_count()
        );
        for (i, placement) in result.placements.iter().enumerate() {
            let t = placement.transform.translation();
            let p = placement.pivot;
            println!(
                "  #{i:<3} scale {:>8.4}  move ({:.4}, {:.4}, {:.4})  pivot ({:.4}, {:.4}, {:.4})",
                placement.transform.scale_factor(),
                t.x,
                t.y,
                t.z,
                p.x,
                p.y,
                p.z
            );
        }
    }

    fn write_obj_file(path: &Path, mesh: &GeomMesh, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# multitransform_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in &mesh.positions {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }
        for tri in mesh.indices.chunks_exact(3) {
            writeln!(w, "f {} {} {}", tri[0] + 1, tri[1] + 1, tri[2] + 1)
                .map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush obj: {e}"))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
