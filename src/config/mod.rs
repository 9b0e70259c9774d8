//! Configuración del proyecto
//! 
//! Este módulo contiene la configuración de variables de entorno
//! y otras configuraciones del sistema.

pub mod environment;

pub use environment::*;
