//! Variants command - list supported aircraft variants.

use console::style;
use liveryinstaller::AircraftVariant;

/// Run the variants command.
pub fn run() {
    println!(
        "{:<14} {:<32} {}",
        style("Variant").bold(),
        style("Package folder").bold(),
        style("Aircraft package").bold()
    );
    for variant in AircraftVariant::ALL {
        println!(
            "{:<14} {:<32} {}",
            variant.code(),
            variant.package_folder(),
            variant.dependency()
        );
    }
}
