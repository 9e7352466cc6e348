extern crate ocl_loader;

use ocl_loader::load_opencl;
use ocl_loader::raw::{cl_platform_id, CL_PLATFORM_NAME, CL_SUCCESS};
use std::ptr;

pub fn main() {
    let cl = load_opencl().unwrap();
    println!(
        "Successfully loaded OpenCL from {} ({} entry points bound)",
        cl.loaded_path().unwrap(),
        cl.api().resolved_count()
    );

    let get_platform_ids = cl.api().clGetPlatformIDs.expect("clGetPlatformIDs is not bound");
    let get_platform_info = cl.api().clGetPlatformInfo.expect("clGetPlatformInfo is not bound");

    let mut num_platforms = 0;
    let err = unsafe { get_platform_ids(0, ptr::null_mut(), &mut num_platforms) };
    assert_eq!(err, CL_SUCCESS);
    println!("Got {} platform(s)", num_platforms);

    let mut platforms: Vec<cl_platform_id> = vec![ptr::null_mut(); num_platforms as usize];
    let err = unsafe { get_platform_ids(num_platforms, platforms.as_mut_ptr(), ptr::null_mut()) };
    assert_eq!(err, CL_SUCCESS);

    for platform in platforms {
        let mut len = 0;
        let err =
            unsafe { get_platform_info(platform, CL_PLATFORM_NAME, 0, ptr::null_mut(), &mut len) };
        assert_eq!(err, CL_SUCCESS);

        let mut name = vec![0u8; len];
        let err = unsafe {
            get_platform_info(
                platform,
                CL_PLATFORM_NAME,
                len,
                name.as_mut_ptr() as *mut _,
                ptr::null_mut(),
            )
        };
        assert_eq!(err, CL_SUCCESS);
        println!(
            "Got platform: {}",
            String::from_utf8_lossy(&name).trim_end_matches('\0')
        );
    }
}
