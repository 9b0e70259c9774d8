//! Catálogo incorporado de coches
//!
//! Precios aproximados del mercado japonés en yenes.

use lazy_static::lazy_static;

use crate::models::car::{Car, CarCategory, CarUsage, Country};

#[allow(clippy::too_many_arguments)]
fn car(
    id: &str,
    maker: &str,
    model: &str,
    category: CarCategory,
    usage: Option<CarUsage>,
    price_yen_estimate: u64,
    country: Country,
    allowed_colors: &[&str],
) -> Car {
    Car {
        id: id.to_string(),
        maker: maker.to_string(),
        model: model.to_string(),
        category,
        usage,
        price_yen_estimate,
        country,
        allowed_colors: allowed_colors.iter().map(|c| c.to_string()).collect(),
    }
}

lazy_static! {
    pub static ref BUILTIN_CARS: Vec<Car> = {
        use CarCategory::*;
        use Country::*;

        vec![
            // Turismos japoneses
            car("toyota-prius", "Toyota", "Prius", JpPassenger, None, 3_200_000, Jp,
                &["white", "silver", "black", "emotional red"]),
            car("toyota-aqua", "Toyota", "Aqua", JpPassenger, None, 2_100_000, Jp,
                &["white", "light blue", "yellow", "black"]),
            car("toyota-alphard", "Toyota", "Alphard", JpPassenger, None, 5_400_000, Jp,
                &["pearl white", "black"]),
            car("honda-nbox", "Honda", "N-BOX", JpPassenger, None, 1_700_000, Jp,
                &["white", "beige", "pink", "green"]),
            car("honda-fit", "Honda", "Fit", JpPassenger, None, 1_800_000, Jp,
                &["white", "blue", "red", "gray"]),
            car("nissan-note", "Nissan", "Note", JpPassenger, None, 2_300_000, Jp,
                &["white", "orange", "blue", "black"]),
            car("nissan-serena", "Nissan", "Serena", JpPassenger, None, 3_000_000, Jp,
                &["white", "silver", "dark blue"]),
            car("mazda-cx5", "Mazda", "CX-5", JpPassenger, None, 3_000_000, Jp,
                &["soul red crystal", "machine gray", "white"]),
            car("suzuki-jimny", "Suzuki", "Jimny", JpPassenger, None, 1_900_000, Jp,
                &["jungle green", "kinetic yellow", "white", "black"]),
            car("daihatsu-tanto", "Daihatsu", "Tanto", JpPassenger, None, 1_500_000, Jp,
                &["white", "mint green", "pink"]),
            car("subaru-forester", "Subaru", "Forester", JpPassenger, None, 3_300_000, Jp,
                &["blue", "white", "gray"]),
            // Vehículos especiales
            car("toyota-himedic", "Toyota", "Himedic", Special, Some(CarUsage::Ambulance), 18_000_000, Jp,
                &["white"]),
            car("nissan-paramedic", "Nissan", "Paramedic", Special, Some(CarUsage::Ambulance), 15_000_000, Jp,
                &["white"]),
            car("hino-ranger-fire", "Hino", "Ranger Fire Engine", Special, Some(CarUsage::FireEngine), 30_000_000, Jp,
                &["red"]),
            car("morita-ladder", "Morita", "Ladder Truck", Special, Some(CarUsage::FireEngine), 120_000_000, Jp,
                &["red"]),
            car("toyota-crown-patrol", "Toyota", "Crown Patrol Car", Special, Some(CarUsage::Police), 4_500_000, Jp,
                &["black and white"]),
            car("isuzu-erga", "Isuzu", "Erga", Special, Some(CarUsage::Bus), 25_000_000, Jp,
                &["white", "blue and white", "green and white"]),
            car("isuzu-elf", "Isuzu", "Elf", Special, Some(CarUsage::Truck), 5_000_000, Jp,
                &["white", "silver", "blue"]),
            car("honda-supercub-mail", "Honda", "Super Cub MD", Special, Some(CarUsage::Mail), 400_000, Jp,
                &["red"]),
            car("isuzu-giga-carrier", "Isuzu", "Giga Car Carrier", Special, Some(CarUsage::Carrier), 20_000_000, Jp,
                &["white", "silver"]),
            car("komatsu-pc200", "Komatsu", "PC200 Excavator", Special, Some(CarUsage::Construction), 20_000_000, Jp,
                &["yellow"]),
            car("yamaha-golf-cart", "Yamaha", "Golf Cart", Special, Some(CarUsage::Other), 1_000_000, Jp,
                &["white", "green"]),
            // Lujo
            car("toyota-century", "Toyota", "Century", Luxury, None, 20_000_000, Jp,
                &["black", "dark silver"]),
            car("lexus-ls", "Lexus", "LS", Luxury, None, 11_000_000, Jp,
                &["sonic white", "black", "silver"]),
            car("nissan-gtr", "Nissan", "GT-R", Luxury, None, 14_000_000, Jp,
                &["ultimate silver", "vibrant red", "white"]),
            car("mercedes-s-class", "Mercedes-Benz", "S-Class", Luxury, None, 16_000_000, Overseas,
                &["obsidian black", "silver", "white"]),
            car("ferrari-roma", "Ferrari", "Roma", Luxury, None, 27_000_000, Overseas,
                &["rosso corsa", "yellow", "white"]),
            car("porsche-911", "Porsche", "911", Luxury, None, 17_000_000, Overseas,
                &["guards red", "gray", "white"]),
            car("volvo-xc90", "Volvo", "XC90", Luxury, None, 9_500_000, Overseas,
                &["crystal white", "denim blue"]),
        ]
    };
}
