extern crate ocl_loader;

use ocl_loader::load_opencl;
use ocl_loader::raw::*;
use std::ffi::CString;
use std::mem::size_of;
use std::os::raw::c_void;
use std::process::exit;
use std::ptr;

const KERNEL_SOURCE: &str = r#"
__kernel
void vector_add(global float* c, global float* a, global float* b, int n) {
    int i = get_global_id(0);
    if (i >= n) return;
    c[i] = a[i] + b[i];
}
"#;

fn check(err: cl_int) {
    if err != CL_SUCCESS {
        panic!(
            "OpenCL error {} ({})",
            err,
            error_name(err).unwrap_or("unknown error code")
        );
    }
}

pub fn main() {
    let cl = load_opencl().expect("failed to load OpenCL");
    let api = *cl.api();

    macro_rules! bound {
        ($f:ident) => {
            api.$f.expect(concat!(stringify!($f), " is not bound"))
        };
    }

    let get_platform_ids = bound!(clGetPlatformIDs);
    let get_platform_info = bound!(clGetPlatformInfo);
    let get_device_ids = bound!(clGetDeviceIDs);
    let get_device_info = bound!(clGetDeviceInfo);
    let create_context = bound!(clCreateContext);
    let create_program_with_source = bound!(clCreateProgramWithSource);
    let build_program = bound!(clBuildProgram);
    let get_program_build_info = bound!(clGetProgramBuildInfo);
    let create_kernel = bound!(clCreateKernel);
    let create_command_queue = bound!(clCreateCommandQueue);
    let create_buffer = bound!(clCreateBuffer);
    let enqueue_write_buffer = bound!(clEnqueueWriteBuffer);
    let set_kernel_arg = bound!(clSetKernelArg);
    let enqueue_nd_range_kernel = bound!(clEnqueueNDRangeKernel);
    let enqueue_read_buffer = bound!(clEnqueueReadBuffer);
    let finish = bound!(clFinish);
    let release_mem_object = bound!(clReleaseMemObject);
    let release_kernel = bound!(clReleaseKernel);
    let release_program = bound!(clReleaseProgram);
    let release_command_queue = bound!(clReleaseCommandQueue);
    let release_context = bound!(clReleaseContext);

    let mut num_platforms = 0;
    check(unsafe { get_platform_ids(0, ptr::null_mut(), &mut num_platforms) });
    if num_platforms == 0 {
        eprintln!("no OpenCL platforms available");
        exit(1);
    }

    let mut platform = ptr::null_mut();
    check(unsafe { get_platform_ids(1, &mut platform, ptr::null_mut()) });

    let mut name_len = 0;
    check(unsafe { get_platform_info(platform, CL_PLATFORM_NAME, 0, ptr::null_mut(), &mut name_len) });
    let mut platform_name = vec![0u8; name_len];
    check(unsafe {
        get_platform_info(
            platform,
            CL_PLATFORM_NAME,
            name_len,
            platform_name.as_mut_ptr() as *mut c_void,
            ptr::null_mut(),
        )
    });
    println!(
        "OpenCL Platform: {}",
        String::from_utf8_lossy(&platform_name).trim_end_matches('\0')
    );

    let mut device = ptr::null_mut();
    check(unsafe { get_device_ids(platform, CL_DEVICE_TYPE_ALL, 1, &mut device, ptr::null_mut()) });

    let mut name_len = 0;
    check(unsafe { get_device_info(device, CL_DEVICE_NAME, 0, ptr::null_mut(), &mut name_len) });
    let mut device_name = vec![0u8; name_len];
    check(unsafe {
        get_device_info(
            device,
            CL_DEVICE_NAME,
            name_len,
            device_name.as_mut_ptr() as *mut c_void,
            ptr::null_mut(),
        )
    });
    println!(
        "OpenCL Device: {}",
        String::from_utf8_lossy(&device_name).trim_end_matches('\0')
    );

    let mut err = CL_SUCCESS;
    let context = unsafe { create_context(ptr::null(), 1, &device, None, ptr::null_mut(), &mut err) };
    check(err);

    let source = CString::new(KERNEL_SOURCE).unwrap();
    let source_ptr = source.as_ptr();
    let source_len = source.as_bytes().len();
    let program =
        unsafe { create_program_with_source(context, 1, &source_ptr, &source_len, &mut err) };
    check(err);

    if unsafe { build_program(program, 1, &device, ptr::null(), None, ptr::null_mut()) } != CL_SUCCESS {
        let mut log_len = 0;
        check(unsafe {
            get_program_build_info(
                program,
                device,
                CL_PROGRAM_BUILD_LOG,
                0,
                ptr::null_mut(),
                &mut log_len,
            )
        });
        let mut log = vec![0u8; log_len];
        check(unsafe {
            get_program_build_info(
                program,
                device,
                CL_PROGRAM_BUILD_LOG,
                log_len,
                log.as_mut_ptr() as *mut c_void,
                ptr::null_mut(),
            )
        });
        eprintln!("{}", String::from_utf8_lossy(&log));
        exit(1);
    }

    let kernel_name = CString::new("vector_add").unwrap();
    let kernel = unsafe { create_kernel(program, kernel_name.as_ptr(), &mut err) };
    check(err);

    let queue = unsafe { create_command_queue(context, device, CL_QUEUE_PROFILING_ENABLE, &mut err) };
    check(err);

    // 10M worth of floats
    let n = 10 * 1000 * 1000 / size_of::<f32>();
    let host_a: Vec<f32> = (0..n).map(|i| i as f32).collect();
    let host_b: Vec<f32> = (0..n).map(|i| i as f32).collect();
    let mut host_c = vec![0f32; n];

    let bytes = n * size_of::<f32>();
    let buffer_a = unsafe { create_buffer(context, CL_MEM_READ_WRITE, bytes, ptr::null_mut(), &mut err) };
    check(err);
    let buffer_b = unsafe { create_buffer(context, CL_MEM_READ_WRITE, bytes, ptr::null_mut(), &mut err) };
    check(err);
    let buffer_c = unsafe { create_buffer(context, CL_MEM_READ_WRITE, bytes, ptr::null_mut(), &mut err) };
    check(err);

    check(unsafe {
        enqueue_write_buffer(
            queue,
            buffer_a,
            CL_FALSE,
            0,
            bytes,
            host_a.as_ptr() as *const c_void,
            0,
            ptr::null(),
            ptr::null_mut(),
        )
    });
    check(unsafe {
        enqueue_write_buffer(
            queue,
            buffer_b,
            CL_FALSE,
            0,
            bytes,
            host_b.as_ptr() as *const c_void,
            0,
            ptr::null(),
            ptr::null_mut(),
        )
    });

    let n_arg = n as cl_int;
    check(unsafe {
        set_kernel_arg(kernel, 0, size_of::<cl_mem>(), &buffer_c as *const _ as *const c_void)
    });
    check(unsafe {
        set_kernel_arg(kernel, 1, size_of::<cl_mem>(), &buffer_a as *const _ as *const c_void)
    });
    check(unsafe {
        set_kernel_arg(kernel, 2, size_of::<cl_mem>(), &buffer_b as *const _ as *const c_void)
    });
    check(unsafe {
        set_kernel_arg(kernel, 3, size_of::<cl_int>(), &n_arg as *const _ as *const c_void)
    });

    let global_work_size = n;
    check(unsafe {
        enqueue_nd_range_kernel(
            queue,
            kernel,
            1,
            ptr::null(),
            &global_work_size,
            ptr::null(),
            0,
            ptr::null(),
            ptr::null_mut(),
        )
    });
    check(unsafe {
        enqueue_read_buffer(
            queue,
            buffer_c,
            CL_FALSE,
            0,
            bytes,
            host_c.as_mut_ptr() as *mut c_void,
            0,
            ptr::null(),
            ptr::null_mut(),
        )
    });
    check(unsafe { finish(queue) });

    for i in 0..n {
        assert_eq!(host_c[i], host_a[i] + host_b[i], "mismatch at index {}", i);
    }
    println!("All values matched!");

    check(unsafe { release_mem_object(buffer_a) });
    check(unsafe { release_mem_object(buffer_b) });
    check(unsafe { release_mem_object(buffer_c) });
    check(unsafe { release_kernel(kernel) });
    check(unsafe { release_program(program) });
    check(unsafe { release_command_queue(queue) });
    check(unsafe { release_context(context) });
}
