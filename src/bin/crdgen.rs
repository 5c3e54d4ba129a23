//! # CRD Generator
//!
//! Prints the CustomResourceDefinitions of the controller as a multi-document
//! YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use package_manager_controller::crd::{ImageConfig, Package, PackageRevision};

fn main() {
    let crds = [Package::crd(), PackageRevision::crd(), ImageConfig::crd()];

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    for crd in &crds {
        match serde_yaml::to_string(crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}
